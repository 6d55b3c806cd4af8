//! Hardware telemetry and alert payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{
    AlertDetails, DetectionStatistics, MongoDate, MongoId, PickingStatistics, Severity,
    TrendData,
};

/// Resource usage in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemUsage {
    pub cpu: f64,
    pub gpu: f64,
    pub ram: f64,
}

/// Component temperatures in °C.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemTemperatures {
    pub cpu: f64,
    pub gpu: f64,
    pub camera_left: f64,
    pub camera_right: f64,
}

/// Station metadata attached to time-series documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationMetadata {
    pub station_id: String,
}

/// One system health sample of a station's compute unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MongoId>,
    pub timestamp: MongoDate,
    pub metadata: StationMetadata,
    pub usage: SystemUsage,
    pub temp: SystemTemperatures,
}

impl SystemHealthRecord {
    /// Returns the station that produced this sample.
    pub fn station_id(&self) -> &str {
        &self.metadata.station_id
    }
}

/// One machine health sample (vacuum and conveyor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineHealthRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MongoId>,
    pub timestamp: MongoDate,
    pub station_id: String,
    /// Vacuum pressure in kPa.
    pub vacuum: f64,
    /// Conveyor speed in m/s.
    pub conveyor_speed: f64,
}

/// An alert raised by a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MongoId>,
    pub timestamp: MongoDate,
    pub station_id: String,
    pub severity: Severity,
    #[serde(rename = "type")]
    pub alert_type: String,
    #[serde(default)]
    pub details: AlertDetails,
}

/// Combined health statistics for a period.
///
/// The nested statistics are aggregated server-side and passed through
/// untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodHealthStatistics {
    #[serde(default)]
    pub period_info: Value,
    #[serde(default)]
    pub system_health: Value,
    #[serde(default)]
    pub machine_health: Value,
    #[serde(default)]
    pub alerts: Value,
}

/// Production summary for today, this week or this month.
///
/// The three periods share one shape; the period-specific fields are
/// present only for the period they belong to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_end: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_end: Option<String>,
    #[serde(default)]
    pub total_picking_attempts: u64,
    #[serde(default)]
    pub total_detected_objects: u64,
    #[serde(default)]
    pub picking_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_daily_picking: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_daily_detection: Option<f64>,
    #[serde(default)]
    pub picking_attempts: PickingStatistics,
    #[serde(default)]
    pub detected_objects: DetectionStatistics,
    #[serde(default)]
    pub daily_trends: Vec<TrendData>,
    #[serde(default)]
    pub stations_summary: Vec<String>,
}
