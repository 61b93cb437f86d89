use axum::http::{HeaderMap, HeaderValue};

use crate::models::Page;

/// Sanitize resource name by removing control characters for HTTP headers
fn sanitize_resource_name(name: &str) -> String {
    name.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()).collect()
}

impl<T> Page<T> {
    /// `Content-Range` value for this page, e.g. `customers 20-29/95`.
    ///
    /// The end is clamped to the last matching row. A page past the end renders
    /// `<start>-<start>` rather than an inverted range.
    #[must_use]
    pub fn content_range(&self, resource_name: &str) -> String {
        let offset = self.page_number.saturating_mul(self.page_size);
        let last = offset
            .saturating_add(self.page_size.max(1))
            .saturating_sub(1)
            .min(self.total_elements.saturating_sub(1))
            .max(offset);
        let safe_name = sanitize_resource_name(resource_name);
        format!("{safe_name} {offset}-{last}/{}", self.total_elements)
    }

    /// Headers carrying [`Self::content_range`].
    #[must_use]
    pub fn content_range_headers(&self, resource_name: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        // Sanitized input is always a valid header value
        if let Ok(value) = HeaderValue::from_str(&self.content_range(resource_name)) {
            headers.insert("Content-Range", value);
        }
        headers
    }
}
