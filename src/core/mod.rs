// Metamodel and resource traits, plus the search orchestrators built on them

pub mod search_operations;
pub mod traits;

// Re-export commonly used items
pub use search_operations::{criteria_search, criteria_search_with_children, distinct_window, restore_order};
pub use traits::{ChildFanOut, ColumnOf, EntityMetamodel, ModelOf, SearchResource};
