//! # Error Handling for Search Queries
//!
//! Every fallible operation in this crate returns a [`SearchError`]. The variants fall into
//! two groups:
//!
//! - **Client errors**: malformed filter text (for example an unparsable date), unknown
//!   attribute names and malformed sort specifications. These surface as `400 Bad Request`.
//! - **Store errors**: anything raised by Sea-ORM while executing a query. These are
//!   propagated unchanged to the caller and surface as `500 Internal Server Error`. The
//!   underlying `DbErr` is logged but never sent to the client.
//!
//! Malformed input that the predicate builder deliberately ignores (mixed-type membership
//! lists, non-boolean values for boolean filters) never produces an error; see
//! [`crate::filtering::PredicateBuilder`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! async fn list_customers(
//!     State(db): State<DatabaseConnection>,
//!     Json(request): Json<SearchRequest>,
//! ) -> Result<Json<Page<customer::Model>>, SearchError> {
//!     Ok(Json(Customers::search(&db, &request, &Filters::default()).await?))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

/// Convenience alias used throughout the crate.
pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A filter value was present but could not be interpreted, e.g. `"2024-13-45"` for a
    /// date bound. Absent or blank values never raise this.
    #[error("filter '{key}' has an invalid {expected} value: '{value}'")]
    InvalidFilterValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    /// A filter, search column or sort field named an attribute the metamodel does not declare.
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    #[error("invalid sort direction '{0}', expected 'asc' or 'desc'")]
    InvalidSortDirection(String),

    #[error("{sort_by} sort fields were given with {sort_direction} sort directions")]
    MismatchedSort {
        sort_by: usize,
        sort_direction: usize,
    },

    /// Query execution failed. Propagated from Sea-ORM without retry.
    #[error("a database error occurred")]
    Database(#[from] DbErr),
}

impl SearchError {
    pub(crate) fn invalid_value(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::InvalidFilterValue {
            key: key.into(),
            value: value.into(),
            expected,
        }
    }

    /// `true` when the error was caused by the request rather than the store.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_))
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database(internal) => {
                tracing::error!(error = ?internal, "Database error during search");
            }
            _ => {
                tracing::debug!(
                    error = %self,
                    status = %self.status_code(),
                    "Rejected search request"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        self.log_internal();

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
