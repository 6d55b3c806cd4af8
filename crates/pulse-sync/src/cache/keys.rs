//! Cache key construction and canonicalization.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Unique key of a cached query: domain, operation and parameters.
///
/// Parameters are stored as canonical JSON: object keys sorted at every
/// level, `null` fields dropped. Two structurally equal parameter values
/// therefore produce the same key regardless of field order, and an
/// omitted filter and an explicit `null` share one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    domain: String,
    operation: String,
    params: String,
}

impl CacheKey {
    /// Creates a key for an operation without parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulse_sync::cache::CacheKey;
    ///
    /// let key = CacheKey::new("stations", "sites");
    /// assert_eq!(key.to_string(), "stations:sites");
    /// assert_eq!(key.params(), None);
    /// ```
    pub fn new(domain: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            operation: operation.into(),
            params: String::new(),
        }
    }

    /// Creates a key from serializable parameters.
    ///
    /// Parameters that cannot be represented as JSON collapse to the
    /// parameterless key.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulse_sync::cache::CacheKey;
    /// use serde_json::json;
    ///
    /// let a = CacheKey::for_params("stats", "period", &json!({ "end_date": "b", "start_date": "a" }));
    /// let b = CacheKey::for_params("stats", "period", &json!({ "start_date": "a", "end_date": "b", "station_ids": null }));
    /// assert_eq!(a, b);
    /// assert_eq!(a.to_string(), r#"stats:period:{"end_date":"b","start_date":"a"}"#);
    /// ```
    pub fn for_params<P: Serialize + ?Sized>(
        domain: impl Into<String>,
        operation: impl Into<String>,
        params: &P,
    ) -> Self {
        let value = serde_json::to_value(params).unwrap_or_default();
        Self::from_value(domain, operation, value)
    }

    /// Creates a key from an already serialized parameter value.
    pub fn from_value(
        domain: impl Into<String>,
        operation: impl Into<String>,
        params: Value,
    ) -> Self {
        let params = match canonicalize(params) {
            Value::Null => String::new(),
            Value::Object(map) if map.is_empty() => String::new(),
            other => other.to_string(),
        };
        Self {
            domain: domain.into(),
            operation: operation.into(),
            params,
        }
    }

    /// Returns the domain (e.g. `health-stats`).
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the operation (e.g. `system-health`).
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns the canonical parameter JSON, if any.
    pub fn params(&self) -> Option<&str> {
        if self.params.is_empty() {
            None
        } else {
            Some(&self.params)
        }
    }

    /// Returns true if the key falls under `domain` and, when given,
    /// `operation`.
    pub fn matches_prefix(&self, domain: &str, operation: Option<&str>) -> bool {
        self.domain == domain && operation.is_none_or(|op| self.operation == op)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.operation)?;
        if !self.params.is_empty() {
            write!(f, ":{}", self.params)?;
        }
        Ok(())
    }
}

/// Sorts object keys recursively and drops `null` object fields.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(String, Value)> = map
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(fields.into_iter().collect::<Map<String, Value>>())
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
