//! # Filtering, Search & Sorting
//!
//! Turns an untyped filter map into a Sea-ORM [`Condition`](sea_orm::Condition) without the
//! caller writing query code.
//!
//! ## Main Components
//!
//! - **[`Filters`]** / **[`FilterValue`]**: filter values decoded once from JSON
//! - **[`PredicateBuilder`]**: predicate factories bound to one entity and one filter map
//! - **[`and`]** / **[`or`]**: combinators that skip absent predicates
//! - **[`normalize_sort`]**: maps sort properties through an entity's enhanced properties
//! - **[`JoinedColumnDef`]**: attributes of joined child collections (`vehicles.make`)
//!
//! ## Filter Keys
//!
//! ```json
//! {
//!   "nameContains": "alpha",
//!   "tiers": ["gold", "silver"],
//!   "active": true,
//!   "createdAtFrom": "2024-01-01T00:00",
//!   "createdAtTo": "2024-12-31T23:59",
//!   "search": "42"
//! }
//! ```
//!
//! Absent and blank values never constrain a query. Malformed date text is rejected, while
//! membership lists of the wrong shape are ignored.
//!
//! ## Database Differences
//!
//! - Date components are extracted with `TO_CHAR` on `PostgreSQL`, `STRFTIME` on `SQLite` and
//!   `DATE_FORMAT` on `MySQL`
//! - Boolean columns compared as text read `true`/`false` on `PostgreSQL` and `1`/`0` elsewhere

pub mod conditions;
pub mod joined;
pub mod search;
pub mod sort;
pub mod values;

// Re-export commonly used items
pub use conditions::{PredicateBuilder, SEARCH_KEY, SEARCH_TEXT_KEY, and, or};
pub use joined::{AttributeRef, JoinedColumnDef, ScalarKind, resolve_attribute};
pub use sort::{normalize_sort, parse_direction};
pub(crate) use sort::parse_direction_lenient;
pub use values::{FilterValue, Filters};
