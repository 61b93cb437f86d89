use async_trait::async_trait;
use sea_orm::{
    Condition, DatabaseConnection, EntityTrait, ModelTrait, Select, TryGetable, Value,
    sea_query::{SimpleExpr, ValueType},
};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use super::search_operations::{criteria_search, criteria_search_with_children};
use crate::errors::SearchResult;
use crate::filtering::{AttributeRef, Filters, JoinedColumnDef, PredicateBuilder, resolve_attribute};
use crate::models::{Page, SearchRequest, SortDirection};

/// The model type of a metamodel's entity.
pub type ModelOf<M> = <<M as EntityMetamodel>::EntityType as EntityTrait>::Model;

/// The column type of a metamodel's entity.
pub type ColumnOf<M> = <<M as EntityMetamodel>::EntityType as EntityTrait>::Column;

/// Queryable description of an entity: its identifier and the attributes filters and sorts may
/// name.
pub trait EntityMetamodel: Sized + Send + Sync + 'static {
    type EntityType: EntityTrait<Model: Sync> + Sync;
    type Id: TryGetable + ValueType + Into<Value> + Clone + Eq + Hash + Debug + Send + Sync;

    const ID_COLUMN: ColumnOf<Self>;

    /// Root attributes by name. Scalar kinds are taken from the column definitions.
    fn attributes() -> Vec<(&'static str, ColumnOf<Self>)>;

    /// Attributes on joined child collections, addressed as `child.column`.
    #[must_use]
    fn joined_attributes() -> Vec<JoinedColumnDef> {
        vec![]
    }

    #[must_use]
    fn has_attribute(name: &str) -> bool {
        Self::resolve(name).is_ok()
    }

    /// Resolve an attribute name or dotted child path.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::UnknownAttribute`] for undeclared names.
    fn resolve(path: &str) -> SearchResult<AttributeRef> {
        resolve_attribute::<Self>(path)
    }

    /// Read the identifier off a loaded model.
    #[must_use]
    fn id_of(model: &ModelOf<Self>) -> Option<Self::Id> {
        <Self::Id as ValueType>::try_from(model.get(Self::ID_COLUMN)).ok()
    }
}

/// Upper bound on how many child rows one parent can join to.
///
/// For a child of a child, declare one bound per level; the oversampling multiplier is their
/// product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildFanOut {
    Bound(u64),
    Levels(Vec<u64>),
}

impl ChildFanOut {
    #[must_use]
    pub fn multiplier(&self) -> u64 {
        match self {
            Self::Bound(bound) => *bound,
            Self::Levels(levels) => levels.iter().fold(1, |product, bound| product.saturating_mul(*bound)),
        }
    }
}

impl Default for ChildFanOut {
    fn default() -> Self {
        Self::Bound(1)
    }
}

/// A searchable resource: a metamodel plus its predicate function and search configuration.
#[async_trait]
pub trait SearchResource: EntityMetamodel {
    const RESOURCE_NAME_PLURAL: &'static str;
    /// Creation timestamp, the secondary sort key when paginating parents with children
    const CREATE_DATE_COLUMN: ColumnOf<Self>;
    /// Attribute sorted on when a parent-with-children search gives no sort. `None` sorts by
    /// [`Self::CREATE_DATE_COLUMN`].
    const DEFAULT_SORT_BY: Option<&'static str> = None;
    const DEFAULT_SORT_DIRECTION: SortDirection = SortDirection::Desc;

    /// Build the entity's predicate from the request filters. `params` carries auxiliary
    /// values supplied by the caller rather than the client.
    ///
    /// # Errors
    ///
    /// Propagates builder failures: unknown attributes and malformed date text.
    fn build_predicate(
        builder: &PredicateBuilder<'_, Self>,
        params: &Filters,
    ) -> SearchResult<Option<Condition>>;

    /// Sort property name to the attribute path actually sorted on.
    #[must_use]
    fn enhanced_properties() -> HashMap<&'static str, &'static str> {
        HashMap::new()
    }

    /// Joins needed by predicates or sorts that reference child attributes.
    #[must_use]
    fn joins(select: Select<Self::EntityType>) -> Select<Self::EntityType> {
        select
    }

    /// Expression to order by for an (already normalized) sort property.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SearchError::UnknownAttribute`] for undeclared names.
    fn sort_path(property: &str) -> SearchResult<SimpleExpr> {
        Ok(Self::resolve(property)?.expr)
    }

    #[must_use]
    fn max_children_per_parent() -> ChildFanOut {
        ChildFanOut::default()
    }

    /// One page of the entity with a single store query plus a count query.
    async fn search(
        db: &DatabaseConnection,
        request: &SearchRequest,
        params: &Filters,
    ) -> SearchResult<Page<ModelOf<Self>>> {
        criteria_search::<Self, _>(db, request, params).await
    }

    /// One page of distinct parents when predicates or sorts touch joined children.
    async fn search_with_children(
        db: &DatabaseConnection,
        request: &SearchRequest,
        params: &Filters,
    ) -> SearchResult<Page<ModelOf<Self>>> {
        criteria_search_with_children::<Self, _>(db, request, params).await
    }
}
