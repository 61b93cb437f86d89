//! The two search orchestrators.
//!
//! [`criteria_search`] pages a single entity with one row query and one count query.
//!
//! [`criteria_search_with_children`] pages parents whose predicate or sort touches a joined
//! one-to-many collection. Joining duplicates a parent once per matching child, so offset and
//! limit cannot be applied to the joined rows directly. Instead:
//!
//! 1. fetch ordered `(id, sort key)` rows from offset 0 with a limit of
//!    `(offset + size) * max_children_per_parent`,
//! 2. dedupe the ids keeping first occurrences and slice the requested window in memory,
//! 3. count distinct ids with the same predicate,
//! 4. load the page's entities by id and restore the id order.
//!
//! The oversampling multiplier is a caller-declared bound. If a parent joins to more child
//! rows than declared, step 1 can miss parents and the page comes back short.

use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DbErr, EntityTrait, FromQueryResult,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QueryResult, QuerySelect, Select, TryGetable,
    sea_query::{Expr, Func, SimpleExpr},
};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use super::traits::{ModelOf, SearchResource};
use crate::errors::SearchResult;
use crate::filtering::{Filters, PredicateBuilder, normalize_sort, parse_direction_lenient};
use crate::models::{Page, Pageable, SearchRequest, SortDirection, SortOrder};

/// A distinct-id row. Only the `id` column is read; ordering columns are ignored.
struct IdRow<I> {
    id: I,
}

impl<I: TryGetable> FromQueryResult for IdRow<I> {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, DbErr> {
        Ok(Self {
            id: res.try_get(pre, "id")?,
        })
    }
}

fn column_expr<C: ColumnTrait>(column: C) -> SimpleExpr {
    Expr::col(column.as_column_ref()).into()
}

fn build_predicate<R: SearchResource>(
    backend: DatabaseBackend,
    filters: &Filters,
    params: &Filters,
) -> SearchResult<Option<Condition>> {
    let builder = PredicateBuilder::<R>::new(filters, backend);
    R::build_predicate(&builder, params)
}

/// The resource's joins with the predicate applied.
fn filtered_select<R: SearchResource>(predicate: Option<Condition>) -> Select<R::EntityType> {
    let select = R::joins(R::EntityType::find());
    match predicate {
        Some(predicate) => select.filter(predicate),
        None => select,
    }
}

/// Resolve the flat-search ordering: each requested key in order, then the identifier in the
/// direction of the last key. No keys orders by identifier ascending.
fn flat_ordering<R: SearchResource>(pageable: &Pageable) -> SearchResult<Vec<(SimpleExpr, Order)>> {
    let orders = normalize_sort(&pageable.sort_orders()?, &R::enhanced_properties());
    let tie_break = orders.last().map_or(SortDirection::Asc, |order| order.direction);

    let mut ordering = orders
        .iter()
        .map(|order| Ok((R::sort_path(&order.property)?, order.direction.into())))
        .collect::<SearchResult<Vec<_>>>()?;
    ordering.push((column_expr(R::ID_COLUMN), tie_break.into()));
    Ok(ordering)
}

/// Resolve the parent-with-children sort key. Blank entries fall back to the resource
/// defaults, the creation timestamp when no default attribute is declared, and any direction
/// other than `asc` sorts descending.
fn children_sort<R: SearchResource>(pageable: &Pageable) -> SearchResult<(SimpleExpr, SortDirection)> {
    let direction = pageable
        .sort_direction
        .first()
        .filter(|d| !d.trim().is_empty())
        .map_or(R::DEFAULT_SORT_DIRECTION, |d| parse_direction_lenient(d));
    let property = pageable
        .sort_by
        .first()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .or(R::DEFAULT_SORT_BY);

    let Some(property) = property else {
        return Ok((column_expr(R::CREATE_DATE_COLUMN), direction));
    };
    let normalized = normalize_sort(&[SortOrder::new(property, direction)], &R::enhanced_properties());
    let property = normalized.first().map_or(property, |order| order.property.as_str());
    Ok((R::sort_path(property)?, direction))
}

/// Number of raw id rows to fetch so that `offset + size` distinct parents are covered.
#[must_use]
pub fn oversampled_window(offset: u64, size: u64, multiplier: u64) -> u64 {
    offset.saturating_add(size).saturating_mul(multiplier)
}

/// Dedupe ids keeping first occurrences, then take `size` of them after skipping `offset`.
pub fn distinct_window<I, It>(ids: It, offset: u64, size: u64) -> Vec<I>
where
    I: Eq + Hash + Clone,
    It: IntoIterator<Item = I>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(size).unwrap_or(usize::MAX))
        .collect()
}

/// Stable-sort `items` into the order of `ids`. Items whose id is missing from `ids` go last.
pub fn restore_order<T, I, F>(items: Vec<T>, ids: &[I], id_of: F) -> Vec<T>
where
    I: Eq + Hash + std::fmt::Debug,
    F: Fn(&T) -> Option<I>,
{
    let rank: HashMap<&I, usize> = ids.iter().enumerate().map(|(position, id)| (id, position)).collect();

    let mut ranked: Vec<(usize, T)> = items
        .into_iter()
        .map(|item| {
            let id = id_of(&item);
            let position = id.as_ref().and_then(|id| rank.get(id).copied());
            if position.is_none() {
                tracing::warn!(id = ?id, "Fetched entity is missing from the page id order");
            }
            (position.unwrap_or(usize::MAX), item)
        })
        .collect();
    ranked.sort_by_key(|(position, _)| *position);
    ranked.into_iter().map(|(_, item)| item).collect()
}

async fn count_distinct_ids<R, C>(select: Select<R::EntityType>, db: &C) -> SearchResult<u64>
where
    R: SearchResource,
    C: ConnectionTrait,
{
    let total: Option<i64> = select
        .select_only()
        .expr(Func::count_distinct(column_expr(R::ID_COLUMN)))
        .into_tuple::<i64>()
        .one(db)
        .await?;
    Ok(total.map_or(0, |count| u64::try_from(count).unwrap_or(0)))
}

/// One page of a single entity.
///
/// Rows are ordered by the requested keys plus the identifier as a final tie-break, so pages
/// fetched at successive offsets never overlap or skip rows. The total is counted with the
/// same predicate and joins. Resources whose joins fan out should use
/// [`criteria_search_with_children`].
///
/// # Errors
///
/// Fails on malformed sorts, predicate builder errors and store errors.
pub async fn criteria_search<R, C>(
    db: &C,
    request: &SearchRequest,
    params: &Filters,
) -> SearchResult<Page<ModelOf<R>>>
where
    R: SearchResource,
    C: ConnectionTrait,
{
    let pageable = &request.pageable;
    let ordering = flat_ordering::<R>(pageable)?;
    let predicate = build_predicate::<R>(db.get_database_backend(), &request.filters, params)?;
    let select = filtered_select::<R>(predicate);

    let total = PaginatorTrait::count(select.clone(), db).await?;

    let items = ordering
        .into_iter()
        .fold(select, |select, (expr, order)| select.order_by(expr, order))
        .offset(pageable.offset())
        .limit(pageable.size)
        .all(db)
        .await?;

    tracing::debug!(
        resource = R::RESOURCE_NAME_PLURAL,
        offset = pageable.offset(),
        limit = pageable.size,
        returned = items.len(),
        total,
        "Flat search"
    );

    Ok(Page::new(items, total, pageable.page, pageable.size))
}

/// One page of distinct parents filtered or sorted through joined children.
///
/// See the module documentation for the algorithm. A page size or multiplier of zero returns
/// an empty page with the correct total.
///
/// # Errors
///
/// Fails on unknown sort attributes, predicate builder errors and store errors.
pub async fn criteria_search_with_children<R, C>(
    db: &C,
    request: &SearchRequest,
    params: &Filters,
) -> SearchResult<Page<ModelOf<R>>>
where
    R: SearchResource,
    C: ConnectionTrait,
{
    let pageable = &request.pageable;
    let (sort_expr, direction) = children_sort::<R>(pageable)?;
    let predicate = build_predicate::<R>(db.get_database_backend(), &request.filters, params)?;
    let select = filtered_select::<R>(predicate);

    let offset = pageable.offset();
    let multiplier = R::max_children_per_parent().multiplier();
    let window = oversampled_window(offset, pageable.size, multiplier);

    let total = count_distinct_ids::<R, C>(select.clone(), db).await?;

    let page_ids = if window == 0 {
        Vec::new()
    } else {
        let order: Order = direction.into();
        let id_expr = column_expr(R::ID_COLUMN);
        let created_expr = column_expr(R::CREATE_DATE_COLUMN);
        let rows = select
            .select_only()
            .expr_as(id_expr.clone(), "id")
            .expr_as(sort_expr.clone(), "sort_key")
            .expr_as(created_expr.clone(), "tie_key")
            .distinct()
            .order_by(sort_expr, order.clone())
            .order_by(created_expr, order.clone())
            .order_by(id_expr, order)
            .limit(window)
            .into_model::<IdRow<R::Id>>()
            .all(db)
            .await?;

        tracing::debug!(
            resource = R::RESOURCE_NAME_PLURAL,
            window,
            multiplier,
            fetched = rows.len(),
            "Fetched oversampled parent ids"
        );
        distinct_window(rows.into_iter().map(|row| row.id), offset, pageable.size)
    };

    let items = if page_ids.is_empty() {
        Vec::new()
    } else {
        let models = R::EntityType::find()
            .filter(R::ID_COLUMN.is_in(page_ids.iter().cloned()))
            .all(db)
            .await?;
        restore_order(models, &page_ids, R::id_of)
    };

    tracing::debug!(
        resource = R::RESOURCE_NAME_PLURAL,
        offset,
        limit = pageable.size,
        returned = items.len(),
        total,
        "Parent-with-children search"
    );

    Ok(Page::new(items, total, pageable.page, pageable.size))
}
