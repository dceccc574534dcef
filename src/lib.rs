// Name Picker - Core Library
// Exposes all modules for use in CLI, TUI, API server, and tests

pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod loader;
pub mod params;
pub mod selection;

// Re-export commonly used types
pub use config::CatalogConfig;
pub use engine::FilterEngine;
pub use entities::{BabyName, Category, NameId, Sex};
pub use error::{CatalogError, CatalogResult};
pub use loader::{load_directory, read_year_records, year_from_file_name, LoadSummary, NameRecord};
pub use params::{GenderFilter, InitialFilter, QueryParams, ResultLimit, SortMode, YearWindow};
pub use selection::{Selection, SelectionRegistry, UserId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
