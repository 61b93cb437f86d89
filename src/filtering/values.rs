//! Loosely-typed filter values, resolved once at the request boundary.

use serde::Deserialize;
use serde_json::{Map, Number, Value as JsonValue};
use std::collections::HashMap;

/// A single filter value.
///
/// JSON numbers are classified the way a JSON mapper would box them: integers that fit in 32
/// bits become [`FilterValue::Int`], larger integers [`FilterValue::Long`], everything else
/// [`FilterValue::Float`]. Membership predicates rely on this distinction.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f64),
    Text(String),
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Convert a JSON value. `null` and objects have no filter meaning and yield `None`.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null | JsonValue::Object(_) => None,
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => Some(Self::from_number(n)),
            JsonValue::String(s) => Some(Self::Text(s.clone())),
            JsonValue::Array(items) => {
                let converted: Option<Vec<Self>> = items.iter().map(Self::from_json).collect();
                // A list with holes can never be matched against a column type
                Some(Self::List(converted.unwrap_or_default()))
            }
        }
    }

    fn from_number(n: &Number) -> Self {
        match n.as_i64() {
            Some(v) => i32::try_from(v).map_or(Self::Long(v), Self::Int),
            None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
        }
    }

    /// Render a scalar as text. Lists have no textual form.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(v) => Some(v.to_string()),
            Self::Long(v) => Some(v.to_string()),
            Self::Float(v) => Some(v.to_string()),
            Self::List(_) => None,
        }
    }

    /// Lenient numeric view: numeric variants, or text holding an integer or decimal.
    #[must_use]
    pub fn as_number(&self) -> Option<sea_orm::Value> {
        match self {
            Self::Int(v) => Some((*v).into()),
            Self::Long(v) => Some((*v).into()),
            Self::Float(v) => Some((*v).into()),
            Self::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<i64>()
                    .map(sea_orm::Value::from)
                    .or_else(|_| trimmed.parse::<f64>().map(sea_orm::Value::from))
                    .ok()
            }
            Self::Bool(_) | Self::List(_) => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Long(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// Filter name to value mapping supplied by the caller, typically decoded from a request body.
///
/// Keys whose JSON value is `null` or an object are dropped on construction, so a present key
/// always carries a usable value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Map<String, JsonValue>")]
pub struct Filters(HashMap<String, FilterValue>);

impl Filters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object. Any other JSON value yields an empty filter set.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Self {
        value
            .as_object()
            .map(|object| Self::from(object.clone()))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FilterValue>) {
        self.0.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// The value rendered as text, if it is a scalar.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(FilterValue::as_text)
    }

    /// The value as text, treating whitespace-only text as absent. Non-blank text is returned
    /// as given, surrounding whitespace included.
    #[must_use]
    pub fn non_blank_text(&self, key: &str) -> Option<String> {
        self.text(key).filter(|text| !text.trim().is_empty())
    }

    #[must_use]
    pub fn number(&self, key: &str) -> Option<sea_orm::Value> {
        self.get(key).and_then(FilterValue::as_number)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, JsonValue>> for Filters {
    fn from(object: Map<String, JsonValue>) -> Self {
        Self(
            object
                .iter()
                .filter_map(|(key, value)| {
                    FilterValue::from_json(value).map(|converted| (key.clone(), converted))
                })
                .collect(),
        )
    }
}

impl FromIterator<(String, FilterValue)> for Filters {
    fn from_iter<I: IntoIterator<Item = (String, FilterValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
