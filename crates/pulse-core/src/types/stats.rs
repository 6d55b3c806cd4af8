//! Picking and detection statistics payloads.

use serde::{Deserialize, Serialize};

use super::common::{DetectionStatistics, PickingStatistics, TrendData};
use crate::params::Granularity;

/// Echo of the requested period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestedPeriod {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub station_ids: Option<Vec<String>>,
    #[serde(default)]
    pub granularity: Option<Granularity>,
}

/// Picking and detection statistics for a custom period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatistics {
    #[serde(default)]
    pub period: RequestedPeriod,
    #[serde(default)]
    pub picking_attempts: PickingStatistics,
    #[serde(default)]
    pub detected_objects: DetectionStatistics,
    #[serde(default)]
    pub daily_trends: Vec<TrendData>,
    #[serde(default)]
    pub hourly_trends: Vec<TrendData>,
}

impl PeriodStatistics {
    /// Returns the trend series matching the granularity that was served.
    pub fn trends(&self) -> &[TrendData] {
        if self.hourly_trends.is_empty() {
            &self.daily_trends
        } else {
            &self.hourly_trends
        }
    }
}
