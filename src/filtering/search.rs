use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    Condition, DatabaseBackend,
    sea_query::{Alias, Expr, Func, LikeExpr, SimpleExpr},
};

use super::conditions::{PredicateBuilder, leaf, or};
use super::joined::AttributeRef;
use crate::core::EntityMetamodel;
use crate::errors::SearchResult;

// Basic safety limits
const MAX_SEARCH_QUERY_LENGTH: usize = 10_000;

/// Escape character declared on every LIKE built here. It needs no quoting in any dialect.
pub(crate) const LIKE_ESCAPE: char = '!';

/// Escape LIKE wildcards to prevent wildcard injection attacks
/// Escapes: % (match any) and _ (match single char)
pub(crate) fn escape_like_wildcards(input: &str) -> String {
    input
        .replace(LIKE_ESCAPE, "!!") // Escape the escape character first
        .replace('%', "!%")
        .replace('_', "!_")
}

/// `CAST(expr AS TEXT)`, or `CAST(expr AS CHAR)` on MySQL.
pub(crate) fn text_cast(expr: SimpleExpr, backend: DatabaseBackend) -> SimpleExpr {
    let target = match backend {
        DatabaseBackend::MySql => "CHAR",
        _ => "TEXT",
    };
    Expr::expr(expr).cast_as(Alias::new(target))
}

/// Text rendering of a boolean column under `CAST(.. AS TEXT)`.
fn boolean_literal(value: bool, backend: DatabaseBackend) -> &'static str {
    match (backend, value) {
        (DatabaseBackend::Postgres, true) => "true",
        (DatabaseBackend::Postgres, false) => "false",
        (_, true) => "1",
        (_, false) => "0",
    }
}

/// Numeric search only applies to plain digit strings without a leading zero, so codes such
/// as `"007"` are left to text search.
fn is_numeric_search(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) && !text.starts_with('0')
}

fn parse_search_boolean(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A component of a stored date or date-time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    /// `YYYY-MM-DD`
    Date,
    /// `YYYY-MM-DD HH:MI`
    DateMinute,
}

impl DatePart {
    const COMPONENTS: [Self; 5] = [Self::Year, Self::Month, Self::Day, Self::Hour, Self::Minute];

    fn format(self, backend: DatabaseBackend) -> &'static str {
        match backend {
            DatabaseBackend::Postgres => match self {
                Self::Year => "YYYY",
                Self::Month => "MM",
                Self::Day => "DD",
                Self::Hour => "HH24",
                Self::Minute => "MI",
                Self::Date => "YYYY-MM-DD",
                Self::DateMinute => "YYYY-MM-DD HH24:MI",
            },
            DatabaseBackend::MySql => match self {
                Self::Year => "%Y",
                Self::Month => "%m",
                Self::Day => "%d",
                Self::Hour => "%H",
                Self::Minute => "%i",
                Self::Date => "%Y-%m-%d",
                Self::DateMinute => "%Y-%m-%d %H:%i",
            },
            DatabaseBackend::Sqlite => match self {
                Self::Year => "%Y",
                Self::Month => "%m",
                Self::Day => "%d",
                Self::Hour => "%H",
                Self::Minute => "%M",
                Self::Date => "%Y-%m-%d",
                Self::DateMinute => "%Y-%m-%d %H:%M",
            },
        }
    }

    /// The backend's date formatting call extracting this part as text.
    fn extract(self, expr: SimpleExpr, backend: DatabaseBackend) -> SimpleExpr {
        let format = self.format(backend);
        match backend {
            DatabaseBackend::Postgres => Func::cust(Alias::new("TO_CHAR")).arg(expr).arg(format).into(),
            DatabaseBackend::MySql => Func::cust(Alias::new("DATE_FORMAT")).arg(expr).arg(format).into(),
            DatabaseBackend::Sqlite => Func::cust(Alias::new("STRFTIME")).arg(format).arg(expr).into(),
        }
    }
}

/// Free-text search across several attributes.
///
/// The search text is read from the builder's search keys (`search`, then `searchText`); blank
/// text yields no predicate. Each variant ORs one match per listed attribute.
impl<M: EntityMetamodel> PredicateBuilder<'_, M> {
    fn search_text(&self) -> Option<String> {
        self.search_keys()
            .iter()
            .find_map(|key| self.filters().non_blank_text(key))
            .map(|text| text.chars().take(MAX_SEARCH_QUERY_LENGTH).collect())
    }

    fn resolve_all(&self, columns: &[&str]) -> SearchResult<Vec<AttributeRef>> {
        columns.iter().map(|column| self.attribute(column)).collect()
    }

    fn any_like(&self, attributes: Vec<AttributeRef>, pattern: &str, upper: bool) -> Option<Condition> {
        or(attributes.into_iter().map(|attribute| {
            let text = if upper {
                self.upper_text(&attribute)
            } else {
                text_cast(attribute.expr, self.backend())
            };
            Some(leaf(
                Expr::expr(text).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)),
            ))
        }))
    }

    /// Case-insensitive substring match of the search text against any of `columns`.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn search(&self, columns: &[&str]) -> SearchResult<Option<Condition>> {
        let attributes = self.resolve_all(columns)?;
        let Some(text) = self.search_text() else {
            return Ok(None);
        };
        let pattern = format!("%{}%", escape_like_wildcards(&text.to_uppercase()));
        Ok(self.any_like(attributes, &pattern, true))
    }

    /// Substring match of a digit-only search text against numeric `columns` cast to text.
    ///
    /// Text with a leading zero or any non-digit never matches here.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn search_numeric(&self, columns: &[&str]) -> SearchResult<Option<Condition>> {
        let attributes = self.resolve_all(columns)?;
        let Some(text) = self.search_text().filter(|text| is_numeric_search(text)) else {
            return Ok(None);
        };
        Ok(self.any_like(attributes, &format!("%{text}%"), false))
    }

    /// Match a `true`/`false` search text (any case) against boolean `columns`, comparing
    /// through the backend's text encoding of booleans.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn search_boolean(&self, columns: &[&str]) -> SearchResult<Option<Condition>> {
        let attributes = self.resolve_all(columns)?;
        let Some(value) = self.search_text().as_deref().and_then(parse_search_boolean) else {
            return Ok(None);
        };
        let pattern = format!("%{}%", boolean_literal(value, self.backend()));
        Ok(self.any_like(attributes, &pattern, false))
    }

    /// Match the search text against date or date-time `columns`.
    ///
    /// `dd/MM/yyyy HH:mm` matches the exact minute and `dd/MM/yyyy` the exact day. Any other
    /// text is matched as a substring of each of the year, month, day, hour and minute
    /// components, so a fragment like `"12"` matches any of them.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn search_dates(&self, columns: &[&str]) -> SearchResult<Option<Condition>> {
        let attributes = self.resolve_all(columns)?;
        let Some(text) = self.search_text() else {
            return Ok(None);
        };
        Ok(or(attributes
            .into_iter()
            .map(|attribute| Some(self.date_match(attribute.expr, &text)))))
    }

    fn date_match(&self, column: SimpleExpr, text: &str) -> Condition {
        let backend = self.backend();

        if let Ok(minute) = NaiveDateTime::parse_from_str(text, "%d/%m/%Y %H:%M") {
            let formatted = minute.format("%Y-%m-%d %H:%M").to_string();
            return leaf(Expr::expr(DatePart::DateMinute.extract(column, backend)).eq(formatted));
        }

        if let Ok(day) = NaiveDate::parse_from_str(text, "%d/%m/%Y") {
            let formatted = day.format("%Y-%m-%d").to_string();
            return leaf(Expr::expr(DatePart::Date.extract(column, backend)).eq(formatted));
        }

        let pattern = format!("%{}%", escape_like_wildcards(text));
        DatePart::COMPONENTS
            .iter()
            .fold(Condition::any(), |any, part| {
                any.add(
                    Expr::expr(part.extract(column.clone(), backend))
                        .like(LikeExpr::new(pattern.as_str()).escape(LIKE_ESCAPE)),
                )
            })
    }
}
