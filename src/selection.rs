// 📝 Selection Registry - one shortlist per collaborating user
//
// Exactly two users (1 and 2) exist. The number is validated on the way in,
// the storage itself is a plain map keyed by user.

use crate::entities::NameId;
use crate::error::{CatalogError, CatalogResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// USER ID
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct UserId(u8);

impl UserId {
    pub const FIRST: UserId = UserId(1);
    pub const SECOND: UserId = UserId(2);
    pub const ALL: [UserId; 2] = [UserId::FIRST, UserId::SECOND];

    pub fn get(&self) -> u8 {
        self.0
    }

    /// The collaborating user
    pub fn other(&self) -> UserId {
        if *self == UserId::FIRST {
            UserId::SECOND
        } else {
            UserId::FIRST
        }
    }
}

impl TryFrom<u8> for UserId {
    type Error = CatalogError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 | 2 => Ok(UserId(value)),
            other => Err(CatalogError::UnknownUser(other)),
        }
    }
}

impl From<UserId> for u8 {
    fn from(user: UserId) -> Self {
        user.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SELECTION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub names: Vec<NameId>,
    /// When the list was last replaced (None = never saved)
    pub saved_at: Option<DateTime<Utc>>,
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct SelectionRegistry {
    lists: BTreeMap<UserId, Selection>,
    active: UserId,
}

impl SelectionRegistry {
    pub fn new() -> Self {
        SelectionRegistry {
            lists: UserId::ALL
                .iter()
                .map(|user| (*user, Selection::default()))
                .collect(),
            active: UserId::FIRST,
        }
    }

    /// Empty lists, with `active` already picking
    pub fn with_active(active: UserId) -> Self {
        SelectionRegistry {
            active,
            ..Self::new()
        }
    }

    /// Replace the user's list (no merge)
    pub fn set(&mut self, user: u8, names: Vec<NameId>) -> CatalogResult<()> {
        let user = UserId::try_from(user)?;
        self.lists.insert(
            user,
            Selection {
                names,
                saved_at: Some(Utc::now()),
            },
        );
        Ok(())
    }

    pub fn get(&self, user: u8) -> CatalogResult<&Selection> {
        let user = UserId::try_from(user)?;
        self.lists.get(&user).ok_or(CatalogError::UnknownUser(user.get()))
    }

    pub fn set_active(&mut self, user: u8) -> CatalogResult<()> {
        self.active = UserId::try_from(user)?;
        Ok(())
    }

    pub fn active(&self) -> UserId {
        self.active
    }

    /// Empty every list; the active user is kept
    pub fn clear(&mut self) {
        for selection in self.lists.values_mut() {
            *selection = Selection::default();
        }
    }
}

impl Default for SelectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
