//! Operation (run/stop) status payloads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Run state of one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationOperationStatus {
    pub station_id: String,
    /// `true` while the station is running.
    pub current_state: bool,
    pub last_updated: String,
    /// Human-readable status label as sent by the backend.
    #[serde(default)]
    pub status: String,
}

/// Current run state of every requested station.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentOperationStatus {
    pub current_time: String,
    /// Stations keyed by id, in the order the backend listed them.
    #[serde(default)]
    pub stations: IndexMap<String, StationOperationStatus>,
}

impl CurrentOperationStatus {
    /// Number of stations currently running.
    pub fn running_count(&self) -> usize {
        self.stations.values().filter(|s| s.current_state).count()
    }

    /// Number of stations reported.
    pub fn total_count(&self) -> usize {
        self.stations.len()
    }
}

/// Time window an operation summary covers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationPeriodInfo {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub total_hours: f64,
}

/// Uptime figures for one station.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationOperationStats {
    pub station_id: String,
    #[serde(default)]
    pub uptime_hours: f64,
    #[serde(default)]
    pub downtime_hours: f64,
    #[serde(default)]
    pub uptime_percentage: f64,
    #[serde(default)]
    pub state_changes: u64,
    #[serde(default)]
    pub total_period_hours: f64,
}

/// Uptime figures across all stations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalOperationStats {
    #[serde(default)]
    pub total_uptime_hours: f64,
    #[serde(default)]
    pub total_downtime_hours: f64,
    #[serde(default)]
    pub uptime_percentage: f64,
    #[serde(default)]
    pub total_state_changes: u64,
    #[serde(default)]
    pub active_stations: u64,
}

/// Operation summary for a fixed or custom period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationSummary {
    pub period: OperationPeriodInfo,
    #[serde(default)]
    pub station_stats: IndexMap<String, StationOperationStats>,
    #[serde(default)]
    pub total_stats: TotalOperationStats,
}

/// Health of the operation statistics service itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationServiceHealth {
    #[serde(default)]
    pub service: String,
    pub status: super::ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
