//! Attribute descriptors and dotted-path resolution.
//!
//! Root attributes are declared as `(name, Column)` pairs by [`EntityMetamodel::attributes`].
//! Attributes that live on a joined child collection are declared with [`JoinedColumnDef`] and
//! referenced with dot notation (e.g. `vehicles.make`).

use sea_orm::{
    ColumnTrait, ColumnType,
    sea_query::{Alias, Expr, SimpleExpr},
};

use crate::core::EntityMetamodel;
use crate::errors::{SearchError, SearchResult};

/// Scalar kind of an attribute, used to coerce and type-check filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    /// 32-bit (or narrower) integer
    Int,
    /// 64-bit integer
    Long,
    Float,
    Decimal,
    Bool,
    Date,
    DateTime,
    /// Date-time with time zone
    Timestamp,
    Uuid,
    Other,
}

impl ScalarKind {
    #[must_use]
    pub fn is_textual(self) -> bool {
        self == Self::String
    }
}

impl From<&ColumnType> for ScalarKind {
    fn from(column_type: &ColumnType) -> Self {
        match column_type {
            ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text | ColumnType::Enum { .. } => {
                Self::String
            }
            ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned => Self::Int,
            ColumnType::BigInteger | ColumnType::Unsigned | ColumnType::BigUnsigned => Self::Long,
            ColumnType::Float | ColumnType::Double => Self::Float,
            ColumnType::Decimal(_) | ColumnType::Money(_) => Self::Decimal,
            ColumnType::Boolean => Self::Bool,
            ColumnType::Date => Self::Date,
            ColumnType::DateTime => Self::DateTime,
            ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => Self::Timestamp,
            ColumnType::Uuid => Self::Uuid,
            _ => Self::Other,
        }
    }
}

/// Describes a filterable or sortable column on a joined/related entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedColumnDef {
    /// Table name or alias the child is joined under (e.g. "vehicles")
    pub join_field: &'static str,
    /// The column name on the related entity (e.g. "make")
    pub column_name: &'static str,
    /// Full dot-notation path (e.g. "vehicles.make")
    pub full_path: &'static str,
    pub kind: ScalarKind,
}

impl JoinedColumnDef {
    #[must_use]
    pub const fn new(
        join_field: &'static str,
        column_name: &'static str,
        full_path: &'static str,
        kind: ScalarKind,
    ) -> Self {
        Self {
            join_field,
            column_name,
            full_path,
            kind,
        }
    }
}

/// A resolved attribute: the queryable expression plus its scalar kind.
#[derive(Debug, Clone)]
pub struct AttributeRef {
    pub path: String,
    pub expr: SimpleExpr,
    pub kind: ScalarKind,
}

impl AttributeRef {
    pub fn column<C: ColumnTrait>(path: &str, column: &C) -> Self {
        Self {
            path: path.to_string(),
            expr: Expr::col(column.as_column_ref()).into(),
            kind: ScalarKind::from(column.def().get_column_type()),
        }
    }

    #[must_use]
    pub fn joined(def: &JoinedColumnDef) -> Self {
        Self {
            path: def.full_path.to_string(),
            expr: Expr::col((Alias::new(def.join_field), Alias::new(def.column_name))).into(),
            kind: def.kind,
        }
    }
}

/// Resolve an attribute name, or a dotted path onto a joined child, against a metamodel.
///
/// # Errors
///
/// Returns [`SearchError::UnknownAttribute`] when the name is not declared.
pub fn resolve_attribute<M: EntityMetamodel>(path: &str) -> SearchResult<AttributeRef> {
    if let Some((name, column)) = M::attributes().into_iter().find(|(name, _)| *name == path) {
        return Ok(AttributeRef::column(name, &column));
    }

    if path.contains('.')
        && let Some(def) = M::joined_attributes()
            .into_iter()
            .find(|def| def.full_path == path)
    {
        return Ok(AttributeRef::joined(&def));
    }

    Err(SearchError::UnknownAttribute(path.to_string()))
}
