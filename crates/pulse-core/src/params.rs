//! Query parameter types for the statistics endpoints.
//!
//! Every parameter struct serializes into the cache key of the query that
//! uses it, and knows how to write itself onto an [`ApiRequest`]. Filters
//! that are `None` are left out of both.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DashboardError, Result};
use crate::transport::ApiRequest;

/// Timestamp format of the windows built here (`YYYY-MM-DDTHH:MM:SS`).
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Offset-less timestamps accepted on input, fractional seconds optional.
const NAIVE_INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A closed time window plus an optional station filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodParams {
    pub start_date: String,
    pub end_date: String,
    /// `None` means every station.
    #[serde(default)]
    pub station_ids: Option<Vec<String>>,
}

impl PeriodParams {
    /// Creates a window over every station.
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            station_ids: None,
        }
    }

    /// Window from local midnight today to 23:59:59 today.
    pub fn today() -> Self {
        Self::for_day(Local::now().date_naive())
    }

    /// Window covering `day`, from 00:00:00 to 23:59:59.
    pub fn for_day(day: NaiveDate) -> Self {
        Self::new(
            format!("{}T00:00:00", day.format("%Y-%m-%d")),
            format!("{}T23:59:59", day.format("%Y-%m-%d")),
        )
    }

    /// Restricts the window to the given stations.
    pub fn with_stations<I, S>(mut self, stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.station_ids = Some(stations.into_iter().map(Into::into).collect());
        self
    }

    /// Checks that both bounds parse and that the window is not inverted.
    pub fn validate(&self) -> Result<()> {
        let start = parse_date_time("start_date", &self.start_date)?;
        let end = parse_date_time("end_date", &self.end_date)?;
        if start > end {
            return Err(DashboardError::validation(
                "end_date",
                "end_date must not be before start_date",
            ));
        }
        Ok(())
    }

    /// Writes `start_date`, `end_date` and one `station_ids` per station.
    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        let request = request
            .query("start_date", &self.start_date)
            .query("end_date", &self.end_date);
        match &self.station_ids {
            Some(ids) => request.query_all("station_ids", ids),
            None => request,
        }
    }
}

/// Parses an ISO 8601 timestamp.
///
/// Timestamps with an offset (`2024-01-01T00:00:00.000Z`) are normalized to
/// UTC; offset-less ones are taken as they are.
fn parse_date_time(field: &str, value: &str) -> Result<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, NAIVE_INPUT_FORMAT).map_err(|_| {
        DashboardError::validation(field, format!("'{}' is not an ISO 8601 timestamp", value))
    })
}

/// Aggregation step of period statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Summary,
    Daily,
    Hourly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Daily => "daily",
            Self::Hourly => "hourly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed summary periods offered by the `summary/{period}` endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryPeriod {
    Today,
    Week,
    Month,
}

impl SummaryPeriod {
    /// Path segment under `summary/`.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Operation name used in cache keys.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Today => "today-summary",
            Self::Week => "week-summary",
            Self::Month => "month-summary",
        }
    }
}

/// Optional multi-station filter, sent as repeated `station_ids`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationFilter {
    #[serde(default)]
    pub station_ids: Option<Vec<String>>,
}

impl StationFilter {
    /// No filter.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on the given stations.
    pub fn stations<I, S>(stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            station_ids: Some(stations.into_iter().map(Into::into).collect()),
        }
    }

    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        match &self.station_ids {
            Some(ids) => request.query_all("station_ids", ids),
            None => request,
        }
    }
}

/// Optional single-station filter, sent as `station_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StationIdFilter {
    #[serde(default)]
    pub station_id: Option<String>,
}

impl StationIdFilter {
    pub fn station(station_id: impl Into<String>) -> Self {
        Self {
            station_id: Some(station_id.into()),
        }
    }

    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        request.query_opt("station_id", self.station_id.as_deref())
    }
}

/// Parameters of `operation-stats/current-status`.
///
/// Unlike the other endpoints, stations are sent as one comma-separated
/// `station_ids` value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrentStatusParams {
    #[serde(default)]
    pub station_ids: Option<Vec<String>>,
}

impl CurrentStatusParams {
    pub fn stations<I, S>(stations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            station_ids: Some(stations.into_iter().map(Into::into).collect()),
        }
    }

    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        request.query_opt(
            "station_ids",
            self.station_ids.as_ref().map(|ids| ids.join(",")),
        )
    }
}

/// Parameters of `operation-stats/period`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationPeriodParams {
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

impl OperationPeriodParams {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
            station_id: None,
            granularity: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        PeriodParams::new(&self.start_date, &self.end_date).validate()
    }

    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        request
            .query("start_date", &self.start_date)
            .query("end_date", &self.end_date)
            .query_opt("station_id", self.station_id.as_deref())
            .query_opt("granularity", self.granularity)
    }
}

/// Parameters of `stats/period`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodStatsParams {
    #[serde(flatten)]
    pub period: PeriodParams,
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

impl PeriodStatsParams {
    pub fn new(period: PeriodParams) -> Self {
        Self {
            period,
            granularity: None,
        }
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = Some(granularity);
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.period.validate()
    }

    pub fn apply(&self, request: ApiRequest) -> ApiRequest {
        self.period
            .apply(request)
            .query_opt("granularity", self.granularity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_validation() {
        let period = PeriodParams::new("2024-01-01T00:00:00", "2024-01-01T23:59:59");
        assert!(period.validate().is_ok());

        let inverted = PeriodParams::new("2024-01-02T00:00:00", "2024-01-01T00:00:00");
        let err = inverted.validate().unwrap_err();
        assert!(matches!(err, DashboardError::Validation { ref field, .. } if field == "end_date"));

        let garbage = PeriodParams::new("2024-01-01", "2024-01-01T00:00:00");
        assert!(garbage.validate().is_err());
    }

    #[test]
    fn test_period_accepts_iso_timestamps() {
        let utc = PeriodParams::new("2024-01-01T00:00:00.000Z", "2024-01-01T23:59:59.000Z");
        assert!(utc.validate().is_ok());

        let fractional = PeriodParams::new("2024-01-01T00:00:00.5", "2024-01-01T00:00:01");
        assert!(fractional.validate().is_ok());

        // 09:00 at +09:00 is midnight UTC, before 01:00Z.
        let offsets = PeriodParams::new("2024-01-01T09:00:00+09:00", "2024-01-01T01:00:00Z");
        assert!(offsets.validate().is_ok());

        let inverted = PeriodParams::new("2024-01-01T10:00:00+09:00", "2024-01-01T00:30:00Z");
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn test_for_day() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let period = PeriodParams::for_day(day);
        assert_eq!(period.start_date, "2024-03-09T00:00:00");
        assert_eq!(period.end_date, "2024-03-09T23:59:59");
    }

    #[test]
    fn test_today_window() {
        let period = PeriodParams::today();
        assert!(period.start_date.ends_with("T00:00:00"));
        assert!(period.end_date.ends_with("T23:59:59"));
        assert_eq!(period.start_date[..10], period.end_date[..10]);
        assert!(period.validate().is_ok());
    }

    #[test]
    fn test_null_filters_are_omitted() {
        let request = PeriodParams::new("a", "b").apply(ApiRequest::get("/p"));
        assert_eq!(request.query_pairs().len(), 2);
        assert_eq!(request.query_value("station_ids"), None);

        let request = StationIdFilter::default().apply(ApiRequest::get("/p"));
        assert!(request.query_pairs().is_empty());
    }

    #[test]
    fn test_station_ids_repeat_or_join() {
        let request = StationFilter::stations(["JSW", "R&T1"]).apply(ApiRequest::get("/p"));
        assert_eq!(request.to_string(), "GET /p?station_ids=JSW&station_ids=R&T1");

        let request = CurrentStatusParams::stations(["JSW", "R&T1"]).apply(ApiRequest::get("/p"));
        assert_eq!(request.query_pairs().len(), 1);
        assert_eq!(request.query_value("station_ids"), Some("JSW,R&T1"));
    }

    #[test]
    fn test_granularity_query() {
        let request = PeriodStatsParams::new(PeriodParams::new("a", "b"))
            .with_granularity(Granularity::Hourly)
            .apply(ApiRequest::get("/p"));
        assert_eq!(request.query_value("granularity"), Some("hourly"));
    }

    #[test]
    fn test_summary_period_names() {
        assert_eq!(SummaryPeriod::Week.operation(), "week-summary");
        assert_eq!(SummaryPeriod::Month.path_segment(), "month");
    }
}
