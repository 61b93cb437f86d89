//! Predicate construction from named filter values.
//!
//! Every factory on [`PredicateBuilder`] returns `Ok(None)` ("no predicate") when its filter is
//! absent or blank, so an entity's predicate function can ask for every supported filter
//! unconditionally and combine the results with [`and`] / [`or`]. "No predicate" is never
//! conflated with an always-true condition: combining nothing yields nothing.
//!
//! ```rust,ignore
//! fn build_predicate(b: &PredicateBuilder<'_, Self>, _params: &Filters) -> SearchResult<Option<Condition>> {
//!     Ok(and([
//!         b.contains("name", Some("nameContains"))?,
//!         b.filter_is_true("active", None)?,
//!         b.is_in("tier", Some("tiers"))?,
//!         b.date_time_between("created_at", Some("createdAt"))?,
//!         or([b.search(&["name", "email"])?, b.search_numeric(&["score"])?]),
//!     ]))
//! }
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sea_orm::{
    Condition, DatabaseBackend, Value,
    sea_query::{Expr, Func, LikeExpr, SimpleExpr},
};
use std::marker::PhantomData;
use uuid::Uuid;

use super::joined::{AttributeRef, ScalarKind};
use super::search::{LIKE_ESCAPE, escape_like_wildcards, text_cast};
use super::values::{FilterValue, Filters};
use crate::core::EntityMetamodel;
use crate::errors::{SearchError, SearchResult};

/// Primary filter key holding free-text search input
pub const SEARCH_KEY: &str = "search";
/// Consulted when [`SEARCH_KEY`] is absent or blank
pub const SEARCH_TEXT_KEY: &str = "searchText";

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// AND of every present predicate; `None` when none are present.
pub fn and<I>(predicates: I) -> Option<Condition>
where
    I: IntoIterator<Item = Option<Condition>>,
{
    combine(Condition::all(), predicates)
}

/// OR of every present predicate; `None` when none are present.
pub fn or<I>(predicates: I) -> Option<Condition>
where
    I: IntoIterator<Item = Option<Condition>>,
{
    combine(Condition::any(), predicates)
}

fn combine<I>(seed: Condition, predicates: I) -> Option<Condition>
where
    I: IntoIterator<Item = Option<Condition>>,
{
    let mut present = predicates.into_iter().flatten().peekable();
    present.peek()?;
    Some(present.fold(seed, |combined, predicate| combined.add(predicate)))
}

pub(crate) fn leaf(expr: SimpleExpr) -> Condition {
    Condition::all().add(expr)
}

/// The filter key to read: the override when it is not blank, otherwise the attribute name.
fn filter_key<'k>(attr: &'k str, key: Option<&'k str>) -> &'k str {
    key.filter(|k| !k.trim().is_empty()).unwrap_or(attr)
}

#[derive(Debug, Clone, Copy)]
enum LikeShape {
    Contains,
    StartsWith,
    EndsWith,
}

impl LikeShape {
    fn pattern(self, escaped: &str) -> String {
        match self {
            Self::Contains => format!("%{escaped}%"),
            Self::StartsWith => format!("{escaped}%"),
            Self::EndsWith => format!("%{escaped}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Bound {
    From,
    To,
}

impl Bound {
    fn suffix(self) -> &'static str {
        match self {
            Self::From => "From",
            Self::To => "To",
        }
    }

    fn apply(self, column: SimpleExpr, value: Value) -> SimpleExpr {
        match self {
            Self::From => Expr::expr(column).gte(value),
            Self::To => Expr::expr(column).lte(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListElementType {
    Text,
    Int,
    Long,
}

impl ListElementType {
    fn of(items: &[FilterValue]) -> Option<Self> {
        let first = match items.first()? {
            FilterValue::Text(_) => Self::Text,
            FilterValue::Int(_) => Self::Int,
            FilterValue::Long(_) => Self::Long,
            _ => return None,
        };
        let uniform = items.iter().all(|item| {
            matches!(
                (first, item),
                (Self::Text, FilterValue::Text(_))
                    | (Self::Int, FilterValue::Int(_))
                    | (Self::Long, FilterValue::Long(_))
            )
        });
        uniform.then_some(first)
    }
}

/// Membership values for a list filter, or `None` when the list is empty, mixed, or does not
/// match the attribute kind.
fn list_values(items: &[FilterValue], kind: ScalarKind) -> Option<Vec<Value>> {
    let element_type = ListElementType::of(items)?;
    match (element_type, kind) {
        (ListElementType::Text, ScalarKind::String)
        | (ListElementType::Int, ScalarKind::Int)
        | (ListElementType::Long, ScalarKind::Long) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    FilterValue::Text(s) => Some(Value::from(s.clone())),
                    FilterValue::Int(v) => Some(Value::from(*v)),
                    FilterValue::Long(v) => Some(Value::from(*v)),
                    _ => None,
                })
                .collect(),
        ),
        (ListElementType::Text, ScalarKind::Uuid) => items
            .iter()
            .map(|item| match item {
                FilterValue::Text(s) => Uuid::parse_str(s.trim()).ok().map(Value::from),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

pub(crate) fn parse_date(key: &str, text: &str) -> SearchResult<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| SearchError::invalid_value(key, text, "date"))
}

pub(crate) fn parse_date_time(key: &str, text: &str) -> SearchResult<NaiveDateTime> {
    let trimmed = text.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| SearchError::invalid_value(key, text, "date-time"))
}

pub(crate) fn parse_instant(key: &str, text: &str) -> SearchResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text.trim())
        .map(|instant| instant.with_timezone(&Utc))
        .map_err(|_| SearchError::invalid_value(key, text, "timestamp"))
}

/// Coerce a scalar filter value for comparison against an attribute of the given kind.
fn coerce_scalar(key: &str, value: &FilterValue, kind: ScalarKind) -> SearchResult<Option<Value>> {
    let coerced = match value {
        FilterValue::List(_) => return Ok(None),
        FilterValue::Bool(b) => Value::from(*b),
        FilterValue::Int(v) => Value::from(*v),
        FilterValue::Long(v) => Value::from(*v),
        FilterValue::Float(v) => Value::from(*v),
        FilterValue::Text(text) => match kind {
            ScalarKind::Uuid => Uuid::parse_str(text.trim())
                .map(Value::from)
                .map_err(|_| SearchError::invalid_value(key, text.as_str(), "UUID"))?,
            ScalarKind::Date => parse_date(key, text)?.into(),
            ScalarKind::DateTime => parse_date_time(key, text)?.into(),
            ScalarKind::Timestamp => parse_instant(key, text)?.into(),
            _ => Value::from(text.clone()),
        },
    };
    Ok(Some(coerced))
}

/// Builds predicates for one entity from one filter map.
///
/// Attribute names are resolved through the metamodel `M` eagerly, so a misspelt attribute
/// fails with [`SearchError::UnknownAttribute`] even when its filter is absent. Filter keys
/// default to the attribute name; range filters read `<base>From` / `<base>To`.
pub struct PredicateBuilder<'a, M> {
    filters: &'a Filters,
    backend: DatabaseBackend,
    search_keys: [&'a str; 2],
    metamodel: PhantomData<fn() -> M>,
}

impl<'a, M: EntityMetamodel> PredicateBuilder<'a, M> {
    #[must_use]
    pub fn new(filters: &'a Filters, backend: DatabaseBackend) -> Self {
        Self {
            filters,
            backend,
            search_keys: [SEARCH_KEY, SEARCH_TEXT_KEY],
            metamodel: PhantomData,
        }
    }

    /// Override the keys free-text search reads (`search`, then `searchText`).
    #[must_use]
    pub fn with_search_keys(mut self, primary: &'a str, fallback: &'a str) -> Self {
        self.search_keys = [primary, fallback];
        self
    }

    #[must_use]
    pub fn filters(&self) -> &'a Filters {
        self.filters
    }

    #[must_use]
    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub(crate) fn search_keys(&self) -> [&'a str; 2] {
        self.search_keys
    }

    /// Resolve an attribute name or dotted child path.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownAttribute`] for undeclared names.
    pub fn attribute(&self, path: &str) -> SearchResult<AttributeRef> {
        M::resolve(path)
    }

    /// The attribute as an upper-cased text expression, casting non-text kinds first.
    pub(crate) fn upper_text(&self, attribute: &AttributeRef) -> SimpleExpr {
        let text = if attribute.kind.is_textual() {
            attribute.expr.clone()
        } else {
            text_cast(attribute.expr.clone(), self.backend)
        };
        Func::upper(text).into()
    }

    // ==========================================
    // EQUALITY
    // ==========================================

    /// `attr = value` when the filter is present. `0` and `false` are values, not absence.
    ///
    /// # Errors
    ///
    /// Fails on unknown attributes, and on text that cannot be parsed for UUID or date kinds.
    pub fn equals(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        self.compare(attr, key, false)
    }

    /// `attr <> value` when the filter is present.
    ///
    /// # Errors
    ///
    /// Same as [`Self::equals`].
    pub fn not_equals(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        self.compare(attr, key, true)
    }

    fn compare(&self, attr: &str, key: Option<&str>, negated: bool) -> SearchResult<Option<Condition>> {
        let attribute = self.attribute(attr)?;
        let key = filter_key(attr, key);
        let Some(value) = self.filters.get(key) else {
            return Ok(None);
        };
        let Some(bound) = coerce_scalar(key, value, attribute.kind)? else {
            tracing::debug!(filter = key, attribute = attr, "ignoring list value for equality filter");
            return Ok(None);
        };

        let column = Expr::expr(attribute.expr);
        Ok(Some(leaf(if negated {
            column.ne(bound)
        } else {
            column.eq(bound)
        })))
    }

    // ==========================================
    // CASE-INSENSITIVE TEXT MATCHING
    // ==========================================

    /// `UPPER(attr) LIKE %VALUE%` when the filter holds non-blank text.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn contains(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        self.text_match(attr, key, LikeShape::Contains, false)
    }

    /// `UPPER(attr) NOT LIKE %VALUE%` when the filter holds non-blank text.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn not_contains(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        self.text_match(attr, key, LikeShape::Contains, true)
    }

    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn starts_with(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        self.text_match(attr, key, LikeShape::StartsWith, false)
    }

    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn ends_with(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        self.text_match(attr, key, LikeShape::EndsWith, false)
    }

    fn text_match(
        &self,
        attr: &str,
        key: Option<&str>,
        shape: LikeShape,
        negated: bool,
    ) -> SearchResult<Option<Condition>> {
        let attribute = self.attribute(attr)?;
        let Some(text) = self.filters.non_blank_text(filter_key(attr, key)) else {
            return Ok(None);
        };

        let pattern = shape.pattern(&escape_like_wildcards(&text.to_uppercase()));
        let like = LikeExpr::new(pattern).escape(LIKE_ESCAPE);
        let column = Expr::expr(self.upper_text(&attribute));
        Ok(Some(leaf(if negated {
            column.not_like(like)
        } else {
            column.like(like)
        })))
    }

    /// `attr IS NULL OR attr = ''`, unconditionally.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_blank(&self, attr: &str) -> SearchResult<Condition> {
        let column = self.attribute(attr)?.expr;
        Ok(Condition::any()
            .add(Expr::expr(column.clone()).is_null())
            .add(Expr::expr(column).eq("")))
    }

    /// `attr IS NOT NULL AND attr <> ''`, unconditionally.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_not_blank(&self, attr: &str) -> SearchResult<Condition> {
        let column = self.attribute(attr)?.expr;
        Ok(Condition::all()
            .add(Expr::expr(column.clone()).is_not_null())
            .add(Expr::expr(column).ne("")))
    }

    // ==========================================
    // BOOLEANS
    // ==========================================

    /// `attr = TRUE`, unconditionally.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_true(&self, attr: &str) -> SearchResult<Condition> {
        Ok(leaf(Expr::expr(self.attribute(attr)?.expr).eq(true)))
    }

    /// `attr = FALSE`, unconditionally.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_false(&self, attr: &str) -> SearchResult<Condition> {
        Ok(leaf(Expr::expr(self.attribute(attr)?.expr).eq(false)))
    }

    /// `attr IS NULL OR attr = FALSE`, unconditionally.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_not_true(&self, attr: &str) -> SearchResult<Condition> {
        self.null_or(attr, false)
    }

    /// `attr IS NULL OR attr = TRUE`, unconditionally.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_not_false(&self, attr: &str) -> SearchResult<Condition> {
        self.null_or(attr, true)
    }

    fn null_or(&self, attr: &str, value: bool) -> SearchResult<Condition> {
        let column = self.attribute(attr)?.expr;
        Ok(Condition::any()
            .add(Expr::expr(column.clone()).is_null())
            .add(Expr::expr(column).eq(value)))
    }

    /// [`Self::is_true`] when the filter is the boolean `true`. Any other value, including the
    /// text `"true"`, yields no predicate.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn filter_is_true(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        let predicate = self.is_true(attr)?;
        Ok((self.boolean_filter(attr, key) == Some(true)).then_some(predicate))
    }

    /// [`Self::is_false`] when the filter is the boolean `false`.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn filter_is_false(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        let predicate = self.is_false(attr)?;
        Ok((self.boolean_filter(attr, key) == Some(false)).then_some(predicate))
    }

    /// [`Self::is_not_true`] when the filter is absent or the boolean `false`.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn filter_is_not_true(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        let predicate = self.is_not_true(attr)?;
        Ok(self.absent_or(attr, key, false).then_some(predicate))
    }

    /// [`Self::is_not_false`] when the filter is absent or the boolean `true`.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn filter_is_not_false(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        let predicate = self.is_not_false(attr)?;
        Ok(self.absent_or(attr, key, true).then_some(predicate))
    }

    fn boolean_filter(&self, attr: &str, key: Option<&str>) -> Option<bool> {
        match self.filters.get(filter_key(attr, key)) {
            Some(FilterValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    fn absent_or(&self, attr: &str, key: Option<&str>, expected: bool) -> bool {
        let key = filter_key(attr, key);
        !self.filters.contains_key(key) || self.boolean_filter(attr, Some(key)) == Some(expected)
    }

    // ==========================================
    // MEMBERSHIP
    // ==========================================

    /// `attr IN (...)` for a scalar or list filter.
    ///
    /// List elements must all be text, all 32-bit or all 64-bit integers, and must match the
    /// attribute kind. Empty, mixed or mismatched lists yield no predicate rather than an error,
    /// so a malformed list never filters out every row.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn is_in(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        Ok(self
            .membership(attr, key)?
            .map(|(column, values)| leaf(Expr::expr(column).is_in(values))))
    }

    /// `attr NOT IN (...)`, with the same fail-open rules as [`Self::is_in`].
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn not_in(&self, attr: &str, key: Option<&str>) -> SearchResult<Option<Condition>> {
        Ok(self
            .membership(attr, key)?
            .map(|(column, values)| leaf(Expr::expr(column).is_not_in(values))))
    }

    fn membership(
        &self,
        attr: &str,
        key: Option<&str>,
    ) -> SearchResult<Option<(SimpleExpr, Vec<Value>)>> {
        let attribute = self.attribute(attr)?;
        let key = filter_key(attr, key);
        let Some(value) = self.filters.get(key) else {
            return Ok(None);
        };

        let values = match value {
            FilterValue::List(items) => list_values(items, attribute.kind),
            FilterValue::Text(s) if attribute.kind == ScalarKind::Uuid => {
                Uuid::parse_str(s.trim()).ok().map(|id| vec![Value::from(id)])
            }
            FilterValue::Text(s) => Some(vec![Value::from(s.clone())]),
            FilterValue::Int(v) => Some(vec![Value::from(*v)]),
            FilterValue::Long(v) => Some(vec![Value::from(*v)]),
            FilterValue::Bool(_) | FilterValue::Float(_) => None,
        };

        if values.is_none() {
            tracing::debug!(
                filter = key,
                attribute = attr,
                kind = ?attribute.kind,
                "ignoring membership filter that does not match the attribute kind"
            );
        }
        Ok(values.map(|values| (attribute.expr, values)))
    }

    // ==========================================
    // RANGES
    // ==========================================

    fn bounded<F>(
        &self,
        attr: &str,
        base: Option<&str>,
        bound: Bound,
        value: F,
    ) -> SearchResult<Option<Condition>>
    where
        F: FnOnce(&Filters, &str) -> SearchResult<Option<Value>>,
    {
        let attribute = self.attribute(attr)?;
        let key = format!("{}{}", filter_key(attr, base), bound.suffix());
        Ok(value(self.filters, &key)?.map(|value| leaf(bound.apply(attribute.expr, value))))
    }

    fn date_value(filters: &Filters, key: &str) -> SearchResult<Option<Value>> {
        filters
            .non_blank_text(key)
            .map(|text| parse_date(key, &text).map(Value::from))
            .transpose()
    }

    fn date_time_value(filters: &Filters, key: &str) -> SearchResult<Option<Value>> {
        filters
            .non_blank_text(key)
            .map(|text| parse_date_time(key, &text).map(Value::from))
            .transpose()
    }

    fn instant_value(filters: &Filters, key: &str) -> SearchResult<Option<Value>> {
        filters
            .non_blank_text(key)
            .map(|text| parse_instant(key, &text).map(Value::from))
            .transpose()
    }

    #[allow(clippy::unnecessary_wraps)]
    fn number_value(filters: &Filters, key: &str) -> SearchResult<Option<Value>> {
        Ok(filters.number(key))
    }

    /// `attr >= <base>From`, parsing `yyyy-MM-dd`.
    ///
    /// # Errors
    ///
    /// Fails when the filter holds text that is not a valid date.
    pub fn date_from(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::From, Self::date_value)
    }

    /// `attr <= <base>To`, parsing `yyyy-MM-dd`.
    ///
    /// # Errors
    ///
    /// Fails when the filter holds text that is not a valid date.
    pub fn date_to(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::To, Self::date_value)
    }

    /// # Errors
    ///
    /// Fails when either bound holds text that is not a valid date.
    pub fn date_between(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        Ok(and([self.date_from(attr, base)?, self.date_to(attr, base)?]))
    }

    /// `attr >= <base>From`, parsing `yyyy-MM-ddTHH:mm[:ss[.f]]`.
    ///
    /// # Errors
    ///
    /// Fails when the filter holds text that is not a valid date-time.
    pub fn date_time_from(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::From, Self::date_time_value)
    }

    /// # Errors
    ///
    /// Fails when the filter holds text that is not a valid date-time.
    pub fn date_time_to(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::To, Self::date_time_value)
    }

    /// # Errors
    ///
    /// Fails when either bound holds text that is not a valid date-time.
    pub fn date_time_between(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        Ok(and([
            self.date_time_from(attr, base)?,
            self.date_time_to(attr, base)?,
        ]))
    }

    /// `attr >= <base>From`, parsing RFC 3339 with an offset and comparing in UTC.
    ///
    /// # Errors
    ///
    /// Fails when the filter holds text that is not a valid RFC 3339 timestamp.
    pub fn instant_from(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::From, Self::instant_value)
    }

    /// # Errors
    ///
    /// Fails when the filter holds text that is not a valid RFC 3339 timestamp.
    pub fn instant_to(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::To, Self::instant_value)
    }

    /// # Errors
    ///
    /// Fails when either bound holds text that is not a valid RFC 3339 timestamp.
    pub fn instant_between(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        Ok(and([self.instant_from(attr, base)?, self.instant_to(attr, base)?]))
    }

    /// `attr >= <base>From` for any numeric value or numeric text; anything else is ignored.
    ///
    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn number_from(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::From, Self::number_value)
    }

    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn number_to(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        self.bounded(attr, base, Bound::To, Self::number_value)
    }

    /// # Errors
    ///
    /// Fails only on unknown attributes.
    pub fn number_between(&self, attr: &str, base: Option<&str>) -> SearchResult<Option<Condition>> {
        Ok(and([self.number_from(attr, base)?, self.number_to(attr, base)?]))
    }
}
