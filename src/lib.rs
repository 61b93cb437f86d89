//! # searchcrate
//!
//! Filter, sort and paginate Sea-ORM entities from untyped search requests.
//!
//! A resource implements [`EntityMetamodel`] (its identifier and the attributes filters may
//! name) and [`SearchResource`] (its predicate function and search configuration). Requests
//! arrive as a [`SearchRequest`]: a map of filter values plus a zero-based [`Pageable`].
//!
//! ```rust,ignore
//! struct Customers;
//!
//! impl EntityMetamodel for Customers {
//!     type EntityType = customer::Entity;
//!     type Id = i64;
//!     const ID_COLUMN: customer::Column = customer::Column::Id;
//!
//!     fn attributes() -> Vec<(&'static str, customer::Column)> {
//!         vec![("name", customer::Column::Name), ("active", customer::Column::Active)]
//!     }
//! }
//!
//! impl SearchResource for Customers {
//!     const RESOURCE_NAME_PLURAL: &'static str = "customers";
//!     const CREATE_DATE_COLUMN: customer::Column = customer::Column::CreatedAt;
//!
//!     fn build_predicate(b: &PredicateBuilder<'_, Self>, _params: &Filters) -> SearchResult<Option<Condition>> {
//!         Ok(and([b.contains("name", Some("nameContains"))?, b.filter_is_true("active", None)?]))
//!     }
//! }
//!
//! let page = Customers::search(&db, &request, &Filters::default()).await?;
//! ```
//!
//! Parents filtered or sorted through a joined one-to-many collection use
//! [`SearchResource::search_with_children`], which pages distinct parents correctly as long
//! as [`SearchResource::max_children_per_parent`] bounds the join fan-out.

pub mod core;
pub mod errors;
pub mod filtering;
pub mod models;
pub mod pagination;

pub use core::{ChildFanOut, EntityMetamodel, ModelOf, SearchResource};
pub use errors::{SearchError, SearchResult};
pub use filtering::{
    FilterValue, Filters, JoinedColumnDef, PredicateBuilder, ScalarKind, and, normalize_sort, or,
};
pub use models::{Page, Pageable, SearchRequest, SortDirection, SortOrder};
