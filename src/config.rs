// ⚙️ Catalog Configuration - year range + data location
// Loaded from JSON; every field has a default so an empty object is valid.

use crate::error::{CatalogError, CatalogResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_YEAR_MIN: i32 = 1880;
pub const DEFAULT_YEAR_MAX: i32 = 2014;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// First year of the catalog range (inclusive)
    #[serde(default = "default_year_min")]
    pub year_min: i32,

    /// Last year of the catalog range (inclusive)
    #[serde(default = "default_year_max")]
    pub year_max: i32,

    /// Directory holding the yobYYYY.txt files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_year_min() -> i32 {
    DEFAULT_YEAR_MIN
}

fn default_year_max() -> i32 {
    DEFAULT_YEAR_MAX
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("names")
}

impl CatalogConfig {
    /// Config covering `year_min..=year_max`, validated
    pub fn with_years(year_min: i32, year_max: i32) -> CatalogResult<Self> {
        let config = CatalogConfig {
            year_min,
            year_max,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: CatalogConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> CatalogResult<()> {
        if self.year_min > self.year_max {
            return Err(CatalogError::InvalidConfig(format!(
                "year_min {} is after year_max {}",
                self.year_min, self.year_max
            )));
        }
        Ok(())
    }

    pub fn contains_year(&self, year: i32) -> bool {
        (self.year_min..=self.year_max).contains(&year)
    }

    /// Number of years in the range
    pub fn span(&self) -> usize {
        (self.year_max - self.year_min + 1) as usize
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            year_min: DEFAULT_YEAR_MIN,
            year_max: DEFAULT_YEAR_MAX,
            data_dir: default_data_dir(),
        }
    }
}
