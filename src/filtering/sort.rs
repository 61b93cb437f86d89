use sea_orm::sea_query::Order;
use std::collections::HashMap;

use crate::errors::{SearchError, SearchResult};
use crate::models::{SortDirection, SortOrder};

/// Parse a sort direction, accepting only `asc` / `desc` in any case.
///
/// # Errors
///
/// Returns [`SearchError::InvalidSortDirection`] for anything else.
pub fn parse_direction(direction: &str) -> SearchResult<SortDirection> {
    match direction.trim() {
        d if d.eq_ignore_ascii_case("asc") => Ok(SortDirection::Asc),
        d if d.eq_ignore_ascii_case("desc") => Ok(SortDirection::Desc),
        _ => Err(SearchError::InvalidSortDirection(direction.to_string())),
    }
}

/// Convert sort order string to a direction, treating anything but `asc` as descending
pub(crate) fn parse_direction_lenient(direction: &str) -> SortDirection {
    if direction.trim().eq_ignore_ascii_case("asc") {
        SortDirection::Asc
    } else {
        SortDirection::Desc
    }
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// Rewrite sort properties through an entity's enhanced-properties mapping.
///
/// Properties with an entry are replaced by the mapped path, all others pass through. Order
/// and directions are preserved.
#[must_use]
pub fn normalize_sort(orders: &[SortOrder], enhanced: &HashMap<&str, &str>) -> Vec<SortOrder> {
    orders
        .iter()
        .map(|order| match enhanced.get(order.property.as_str()) {
            Some(path) if !order.property.trim().is_empty() => SortOrder {
                property: (*path).to_string(),
                direction: order.direction,
            },
            _ => order.clone(),
        })
        .collect()
}
