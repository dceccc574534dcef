// 👶 BabyName Entity - identity + yearly popularity history
//
// "The name is IDENTITY (never changes), the counts are VALUES (accumulate per year)"
//
// - identity and first letter are fixed at creation
// - category starts as the first observed sex and can only move to Unisex
// - history covers the catalog's year range once backfilled
// - rolling popularity is derived from history for the active year window

use crate::error::{CatalogError, CatalogResult};
use crate::params::YearWindow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SEX / CATEGORY
// ============================================================================

/// Sex as reported by a single source record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn code(&self) -> char {
        match self {
            Sex::Female => 'F',
            Sex::Male => 'M',
        }
    }
}

impl FromStr for Sex {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "F" | "f" => Ok(Sex::Female),
            "M" | "m" => Ok(Sex::Male),
            other => Err(CatalogError::invalid_record(
                other,
                format!("unknown sex code {:?}", other),
            )),
        }
    }
}

/// Category of a catalog entry: the sex it was first seen with, or Unisex
/// once records of both sexes have been observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Female,
    Male,
    Unisex,
}

impl Category {
    /// Single-letter code used in rendered display entries
    pub fn code(&self) -> char {
        match self {
            Category::Female => 'F',
            Category::Male => 'M',
            Category::Unisex => 'U',
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Female => "Female",
            Category::Male => "Male",
            Category::Unisex => "Unisex",
        }
    }
}

impl From<Sex> for Category {
    fn from(sex: Sex) -> Self {
        match sex {
            Sex::Female => Category::Female,
            Sex::Male => Category::Male,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// BABY NAME ENTITY
// ============================================================================

/// Handle of an entity inside one engine's catalog.
///
/// The epoch ties it to one load of the catalog; `FilterEngine::clear`
/// starts a new epoch and every older handle stops resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameId {
    pub(crate) index: usize,
    pub(crate) epoch: u32,
}

impl NameId {
    pub(crate) fn new(index: usize, epoch: u32) -> Self {
        NameId { index, epoch }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BabyName {
    // ========================================================================
    // IDENTITY (never changes)
    // ========================================================================
    id: NameId,
    name: String,
    first_letter: char,

    // ========================================================================
    // VALUES
    // ========================================================================
    category: Category,

    /// year → number of births recorded under this name
    history: BTreeMap<i32, u64>,

    /// Derived: sum of `history` over the active year window
    rolling_popularity: u64,
}

impl BabyName {
    /// Create a new entity from its first observed record
    pub fn new(id: NameId, name: &str, sex: Sex) -> CatalogResult<Self> {
        let first_letter = name
            .chars()
            .next()
            .ok_or_else(|| CatalogError::invalid_record(name, "empty name"))?;

        Ok(BabyName {
            id,
            name: name.to_string(),
            first_letter,
            category: sex.into(),
            history: BTreeMap::new(),
            rolling_popularity: 0,
        })
    }

    pub fn id(&self) -> NameId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn first_letter(&self) -> char {
        self.first_letter
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn history(&self) -> &BTreeMap<i32, u64> {
        &self.history
    }

    pub fn frequency(&self, year: i32) -> Option<u64> {
        self.history.get(&year).copied()
    }

    pub fn rolling_popularity(&self) -> u64 {
        self.rolling_popularity
    }

    /// Record the count for one year. Last write wins.
    pub fn record_observation(&mut self, year: i32, frequency: i64) -> CatalogResult<()> {
        let frequency = u64::try_from(frequency).map_err(|_| {
            CatalogError::invalid_record(
                &self.name,
                format!("negative frequency {} for year {}", frequency, year),
            )
        })?;

        self.history.insert(year, frequency);
        Ok(())
    }

    /// Promote to Unisex when a record disagrees with the current category.
    /// Returns true if the category changed.
    pub fn promote_category_if_conflicting(&mut self, observed: Sex) -> bool {
        if self.category == Category::Unisex || self.category == Category::from(observed) {
            return false;
        }

        self.category = Category::Unisex;
        true
    }

    /// Fill every year of `year_min..=year_max` that has no record with 0
    pub fn backfill_missing_years(&mut self, year_min: i32, year_max: i32) {
        for year in year_min..=year_max {
            self.history.entry(year).or_insert(0);
        }
    }

    /// Sum the most recent `window` years of history
    pub fn recompute_rolling_popularity(&mut self, window: YearWindow) -> u64 {
        self.rolling_popularity = match window {
            YearWindow::All => self.history.values().sum(),
            YearWindow::Last(n) => self.history.values().rev().take(n.get() as usize).sum(),
        };
        self.rolling_popularity
    }

    /// Display form consumed by front ends: `"{name} ({popularity} {category})"`
    pub fn render(&self) -> String {
        format!("{} ({} {})", self.name, self.rolling_popularity, self.category)
    }
}

// ============================================================================
// TESTS
// ============================================================================
