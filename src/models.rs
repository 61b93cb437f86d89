use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{SearchError, SearchResult};
use crate::filtering::{Filters, parse_direction};

/// Page size used when a request omits `size`.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort key: a property name (or dotted child path) and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder {
    pub property: String,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(property: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }
}

/// Zero-based page request with parallel sort lists.
///
/// ```json
/// {"page": 0, "size": 25, "sortBy": ["name", "createDate"], "sortDirection": ["asc", "desc"]}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Pageable {
    /// Zero-based page index
    #[schema(example = 0)]
    pub page: u64,
    #[schema(example = 20)]
    pub size: u64,
    /// Sort properties, most significant first
    #[schema(example = json!(["name"]))]
    pub sort_by: Vec<String>,
    /// `asc` or `desc` for each entry of `sortBy`
    #[schema(example = json!(["asc"]))]
    pub sort_direction: Vec<String>,
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: Vec::new(),
            sort_direction: Vec::new(),
        }
    }
}

impl Pageable {
    #[must_use]
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page,
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort_by: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort_by.push(sort_by.into());
        self.sort_direction.push(direction.into());
        self
    }

    /// Number of rows preceding this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// Pair `sortBy` with `sortDirection`, parsing each direction strictly.
    ///
    /// # Errors
    ///
    /// [`SearchError::MismatchedSort`] when the lists differ in length, and
    /// [`SearchError::InvalidSortDirection`] for a direction other than `asc`/`desc`.
    pub fn sort_orders(&self) -> SearchResult<Vec<SortOrder>> {
        if self.sort_by.len() != self.sort_direction.len() {
            return Err(SearchError::MismatchedSort {
                sort_by: self.sort_by.len(),
                sort_direction: self.sort_direction.len(),
            });
        }

        self.sort_by
            .iter()
            .zip(&self.sort_direction)
            .map(|(property, direction)| Ok(SortOrder::new(property.clone(), parse_direction(direction)?)))
            .collect()
    }
}

/// A search request: filter values plus paging and sorting.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(default)]
pub struct SearchRequest {
    /// Filter name to value. Values may be strings, numbers, booleans or arrays of those.
    #[schema(value_type = Object, example = json!({"nameContains": "alpha", "active": true}))]
    pub filters: Filters,
    pub pageable: Pageable,
}

impl SearchRequest {
    #[must_use]
    pub fn new(filters: Filters, pageable: Pageable) -> Self {
        Self { filters, pageable }
    }
}

/// One page of results with the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matches across all pages
    pub total_elements: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total_elements: u64, page_number: u64, page_size: u64) -> Self {
        Self {
            items,
            total_elements,
            page_number,
            page_size,
        }
    }

    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.page_size)
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page_number.saturating_add(1) < self.total_pages()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            page_number: self.page_number,
            page_size: self.page_size,
        }
    }
}
