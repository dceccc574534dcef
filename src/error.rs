// ⚠️ Catalog Errors - local validation failures
// None of these are fatal: the caller fixes the input and tries again.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// A record that cannot be part of the catalog (negative count, empty name, bad sex code)
    #[error("invalid record for {identity:?}: {reason}")]
    InvalidRecord { identity: String, reason: String },

    #[error("year {year} is outside the catalog range {min}..={max}")]
    OutOfRangeYear { year: i32, min: i32, max: i32 },

    /// A rendered display entry whose name is not in the catalog
    #[error("no catalog entry for {0:?}")]
    UnresolvedEntity(String),

    #[error("unknown user {0} (expected 1 or 2)")]
    UnknownUser(u8),

    #[error("catalog is already finalized; records can no longer be added")]
    CatalogFinalized,

    #[error("invalid {param} value {value:?}")]
    InvalidParam { param: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CatalogError {
    pub fn invalid_record(identity: &str, reason: impl Into<String>) -> Self {
        CatalogError::InvalidRecord {
            identity: identity.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_param(param: &'static str, value: &str) -> Self {
        CatalogError::InvalidParam {
            param,
            value: value.to_string(),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
