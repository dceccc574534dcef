// 🎛️ Query Parameters - the five knobs of a catalog query
//
// Every parameter parses from the legacy single-letter codes
// ("A", "P", "p", "0"...) as well as readable words, so front ends
// and the CLI share one vocabulary.

use crate::entities::Category;
use crate::error::{CatalogError, CatalogResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::{NonZeroU16, NonZeroUsize};
use std::str::FromStr;

// ============================================================================
// GENDER FILTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GenderFilter {
    #[default]
    All,
    Female,
    Male,
    Unisex,
}

impl GenderFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            GenderFilter::All => true,
            GenderFilter::Female => category == Category::Female,
            GenderFilter::Male => category == Category::Male,
            GenderFilter::Unisex => category == Category::Unisex,
        }
    }

    /// Next value in the All → Female → Male → Unisex cycle
    pub fn cycle(&self) -> Self {
        match self {
            GenderFilter::All => GenderFilter::Female,
            GenderFilter::Female => GenderFilter::Male,
            GenderFilter::Male => GenderFilter::Unisex,
            GenderFilter::Unisex => GenderFilter::All,
        }
    }
}

impl FromStr for GenderFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" | "all" => Ok(GenderFilter::All),
            "F" | "f" | "female" => Ok(GenderFilter::Female),
            "M" | "m" | "male" => Ok(GenderFilter::Male),
            "U" | "u" | "unisex" => Ok(GenderFilter::Unisex),
            other => Err(CatalogError::invalid_param("gender", other)),
        }
    }
}

impl fmt::Display for GenderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GenderFilter::All => "all",
            GenderFilter::Female => "female",
            GenderFilter::Male => "male",
            GenderFilter::Unisex => "unisex",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// SORT MODE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortMode {
    #[default]
    Alphabetical,
    PopularityDesc,
    PopularityAsc,
}

impl SortMode {
    pub fn cycle(&self) -> Self {
        match self {
            SortMode::Alphabetical => SortMode::PopularityDesc,
            SortMode::PopularityDesc => SortMode::PopularityAsc,
            SortMode::PopularityAsc => SortMode::Alphabetical,
        }
    }
}

impl FromStr for SortMode {
    type Err = CatalogError;

    // Codes are case-sensitive: "P" is most popular first, "p" least popular first
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "alpha" | "alphabetical" => Ok(SortMode::Alphabetical),
            "P" | "pop" | "popular" | "pop-desc" => Ok(SortMode::PopularityDesc),
            "p" | "rare" | "pop-asc" => Ok(SortMode::PopularityAsc),
            other => Err(CatalogError::invalid_param("sort", other)),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortMode::Alphabetical => "alphabetical",
            SortMode::PopularityDesc => "pop-desc",
            SortMode::PopularityAsc => "pop-asc",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// INITIAL LETTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialFilter {
    #[default]
    Any,
    Letter(char),
}

impl InitialFilter {
    /// Exact, case-sensitive comparison against the stored first letter
    pub fn matches(&self, first_letter: char) -> bool {
        match self {
            InitialFilter::Any => true,
            InitialFilter::Letter(c) => *c == first_letter,
        }
    }
}

impl FromStr for InitialFilter {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "0" || s == "any" {
            return Ok(InitialFilter::Any);
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(InitialFilter::Letter(c)),
            _ => Err(CatalogError::invalid_param("initial", s)),
        }
    }
}

impl fmt::Display for InitialFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitialFilter::Any => write!(f, "any"),
            InitialFilter::Letter(c) => write!(f, "{}", c),
        }
    }
}

// ============================================================================
// YEAR WINDOW
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YearWindow {
    /// Entire catalog range
    #[default]
    All,
    /// The most recent n years
    Last(NonZeroU16),
}

impl YearWindow {
    pub fn last(years: u16) -> Self {
        NonZeroU16::new(years).map_or(YearWindow::All, YearWindow::Last)
    }
}

impl FromStr for YearWindow {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "all" {
            return Ok(YearWindow::All);
        }
        s.parse::<u16>()
            .map(YearWindow::last)
            .map_err(|_| CatalogError::invalid_param("years", s))
    }
}

impl fmt::Display for YearWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YearWindow::All => write!(f, "all"),
            YearWindow::Last(n) => write!(f, "{}", n),
        }
    }
}

// ============================================================================
// RESULT LIMIT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResultLimit {
    #[default]
    Unbounded,
    Top(NonZeroUsize),
}

impl ResultLimit {
    pub fn top(count: usize) -> Self {
        NonZeroUsize::new(count).map_or(ResultLimit::Unbounded, ResultLimit::Top)
    }

    pub fn is_reached(&self, collected: usize) -> bool {
        match self {
            ResultLimit::Unbounded => false,
            ResultLimit::Top(k) => collected >= k.get(),
        }
    }
}

impl FromStr for ResultLimit {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "all" {
            return Ok(ResultLimit::Unbounded);
        }
        s.parse::<usize>()
            .map(ResultLimit::top)
            .map_err(|_| CatalogError::invalid_param("limit", s))
    }
}

impl fmt::Display for ResultLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultLimit::Unbounded => write!(f, "all"),
            ResultLimit::Top(k) => write!(f, "{}", k),
        }
    }
}

// ============================================================================
// QUERY PARAMS
// ============================================================================

/// One complete query. Two snapshots compare equal exactly when a refresh
/// would produce the same display list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueryParams {
    pub gender: GenderFilter,
    pub sort: SortMode,
    pub initial: InitialFilter,
    pub years: YearWindow,
    pub limit: ResultLimit,
}

impl QueryParams {
    /// Build from raw text values; `None` keeps the default for that field
    pub fn parse(
        gender: Option<&str>,
        sort: Option<&str>,
        initial: Option<&str>,
        years: Option<&str>,
        limit: Option<&str>,
    ) -> CatalogResult<Self> {
        Ok(QueryParams {
            gender: gender.map(str::parse::<GenderFilter>).transpose()?.unwrap_or_default(),
            sort: sort.map(str::parse::<SortMode>).transpose()?.unwrap_or_default(),
            initial: initial.map(str::parse::<InitialFilter>).transpose()?.unwrap_or_default(),
            years: years.map(str::parse::<YearWindow>).transpose()?.unwrap_or_default(),
            limit: limit.map(str::parse::<ResultLimit>).transpose()?.unwrap_or_default(),
        })
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gender={} sort={} initial={} years={} limit={}",
            self.gender, self.sort, self.initial, self.years, self.limit
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_codes() {
        assert_eq!("A".parse::<GenderFilter>().unwrap(), GenderFilter::All);
        assert_eq!("U".parse::<GenderFilter>().unwrap(), GenderFilter::Unisex);
        assert_eq!("P".parse::<SortMode>().unwrap(), SortMode::PopularityDesc);
        assert_eq!("p".parse::<SortMode>().unwrap(), SortMode::PopularityAsc);
        assert_eq!("0".parse::<InitialFilter>().unwrap(), InitialFilter::Any);
        assert_eq!("0".parse::<YearWindow>().unwrap(), YearWindow::All);
        assert_eq!("0".parse::<ResultLimit>().unwrap(), ResultLimit::Unbounded);
    }

    #[test]
    fn test_readable_words() {
        assert_eq!("female".parse::<GenderFilter>().unwrap(), GenderFilter::Female);
        assert_eq!("rare".parse::<SortMode>().unwrap(), SortMode::PopularityAsc);
        assert_eq!("K".parse::<InitialFilter>().unwrap(), InitialFilter::Letter('K'));
        assert_eq!("10".parse::<YearWindow>().unwrap(), YearWindow::last(10));
        assert_eq!("all".parse::<ResultLimit>().unwrap(), ResultLimit::Unbounded);
        assert_eq!("25".parse::<ResultLimit>().unwrap(), ResultLimit::top(25));
    }

    #[test]
    fn test_invalid_values() {
        assert!("X".parse::<GenderFilter>().is_err());
        assert!("Q".parse::<SortMode>().is_err());
        assert!("AB".parse::<InitialFilter>().is_err());
        assert!("-3".parse::<YearWindow>().is_err());
        assert!("many".parse::<ResultLimit>().is_err());
    }

    #[test]
    fn test_initial_is_case_sensitive() {
        let filter = InitialFilter::Letter('a');
        assert!(filter.matches('a'));
        assert!(!filter.matches('A'));
        assert!(InitialFilter::Any.matches('Z'));
    }

    #[test]
    fn test_limit_reached() {
        assert!(!ResultLimit::Unbounded.is_reached(usize::MAX));
        assert!(!ResultLimit::top(2).is_reached(1));
        assert!(ResultLimit::top(2).is_reached(2));
    }

    #[test]
    fn test_query_params_parse_defaults() {
        let params = QueryParams::parse(Some("F"), None, Some("E"), Some("5"), None).unwrap();

        assert_eq!(params.gender, GenderFilter::Female);
        assert_eq!(params.sort, SortMode::Alphabetical);
        assert_eq!(params.initial, InitialFilter::Letter('E'));
        assert_eq!(params.years, YearWindow::last(5));
        assert_eq!(params.limit, ResultLimit::Unbounded);

        let err = QueryParams::parse(None, Some("sideways"), None, None, None).unwrap_err();
        assert_eq!(err, CatalogError::invalid_param("sort", "sideways"));
    }
}
