// Entity Models
// "Identity persists, values change": a name is created once and only its
// yearly counts (and derived popularity) move afterwards.

pub mod name;

pub use name::{BabyName, Category, NameId, Sex};
