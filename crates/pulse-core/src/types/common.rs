//! Building blocks shared by several statistics payloads.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A timestamp as served by the statistics backend.
///
/// Documents coming straight from the time-series store use Mongo extended
/// JSON (`{"$date": "..."}`); aggregated endpoints send a plain string.
/// Both deserialize to the same value.
///
/// # Example
///
/// ```
/// use pulse_core::MongoDate;
///
/// let plain: MongoDate = serde_json::from_str(r#""2024-01-01T08:00:00Z""#).unwrap();
/// let extended: MongoDate =
///     serde_json::from_str(r#"{"$date": "2024-01-01T08:00:00Z"}"#).unwrap();
/// assert_eq!(plain, extended);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MongoDate(String);

impl MongoDate {
    /// Creates a timestamp from its string form.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the timestamp. Naive timestamps are read as UTC.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.0) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Ordering key: parsed instant first, raw string as a tiebreaker.
    pub fn sort_key(&self) -> (Option<DateTime<Utc>>, &str) {
        (self.parse(), &self.0)
    }
}

impl fmt::Display for MongoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MongoDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Extended {
                #[serde(rename = "$date")]
                date: String,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(value) | Raw::Extended { date: value } => Self(value),
        })
    }
}

/// A document id, either a plain string or `{"$oid": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MongoId(String);

impl MongoId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MongoId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Plain(String),
            Extended {
                #[serde(rename = "$oid")]
                oid: String,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Plain(value) | Raw::Extended { oid: value } => Self(value),
        })
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
    #[serde(other)]
    Other,
}

/// Picking or detection totals for a period.
///
/// Only the total and the per-category breakdown are interpreted; any
/// other field the backend adds is kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub by_category: IndexMap<String, u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Picking attempt statistics.
pub type PickingStatistics = CategoryBreakdown;

/// Detected object statistics.
pub type DetectionStatistics = CategoryBreakdown;

/// One point of a daily or hourly trend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub picking_count: u64,
    #[serde(default)]
    pub detection_count: u64,
    #[serde(default)]
    pub picking_rate: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Threshold details attached to an alert. Which fields are present
/// depends on the component that raised it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertDetails {
    pub component: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_right: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_right: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_date_parse() {
        let date = MongoDate::new("2024-01-01T08:30:00");
        let parsed = date.parse().expect("naive timestamp parses");
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T08:30:00+00:00");

        let date = MongoDate::new("2024-01-01T08:30:00.250+09:00");
        assert!(date.parse().is_some());

        assert!(MongoDate::new("yesterday").parse().is_none());
    }

    #[test]
    fn test_mongo_id_forms() {
        let plain: MongoId = serde_json::from_str(r#""65a1""#).unwrap();
        let extended: MongoId = serde_json::from_str(r#"{"$oid": "65a1"}"#).unwrap();
        assert_eq!(plain, extended);
        assert_eq!(plain.as_str(), "65a1");
    }

    #[test]
    fn test_unknown_severity() {
        let severity: Severity = serde_json::from_str(r#""emergency""#).unwrap();
        assert_eq!(severity, Severity::Other);
        let severity: Severity = serde_json::from_str(r#""critical""#).unwrap();
        assert_eq!(severity, Severity::Critical);
    }

    #[test]
    fn test_breakdown_keeps_unknown_fields() {
        let stats: CategoryBreakdown =
            serde_json::from_str(r#"{"total": 12, "by_category": {"PET": 7}, "success": 9}"#)
                .unwrap();
        assert_eq!(stats.total, 12);
        assert_eq!(stats.by_category["PET"], 7);
        assert_eq!(stats.extra["success"], 9);
    }
}
