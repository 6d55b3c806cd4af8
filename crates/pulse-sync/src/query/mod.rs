//! Typed queries (fetch adapters).
//!
//! A [`Query`] names its cache slot, says how long a result stays fresh,
//! and knows how to fetch and decode its payload through an
//! [`ApiTransport`]. Adapters are pure: parameters in, typed value or a
//! classified [`DashboardError`] out.

mod health;
mod operation;
mod stations;
mod stats;

pub use health::{
    AlertsQuery, HEALTH_STATS, HealthPeriodQuery, HealthSummaryQuery, MachineHealthQuery,
    SystemHealthQuery,
};
pub use operation::{
    CurrentStatusQuery, OPERATION_STATS, OperationHealthQuery, OperationPeriodQuery,
    OperationSummaryQuery,
};
pub use stations::{
    AllStationsQuery, STATIONS, SitesQuery, StationCacheStatusQuery, StationsBySiteQuery,
};
pub use stats::{STATS, StatsPeriodQuery, StatsSummaryQuery};

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::{ApiTransport, DashboardError, SummaryPeriod};

use crate::cache::CacheKey;

/// A cacheable read against the backend.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone)]
/// struct ServiceHealth;
///
/// #[async_trait]
/// impl Query for ServiceHealth {
///     type Output = OperationServiceHealth;
///
///     fn key(&self) -> CacheKey {
///         CacheKey::new("operation-stats", "health")
///     }
///
///     fn stale_after(&self, stale: &StaleTimes) -> Duration {
///         stale.operation_health
///     }
///
///     async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
///         let body = transport.send(&ApiRequest::get("/api/v1/operation-stats/health")).await?;
///         decode_body(body)
///     }
/// }
/// ```
#[async_trait]
pub trait Query: Clone + Send + Sync + 'static {
    /// Decoded payload stored in the cache.
    type Output: Send + Sync + 'static;

    /// Cache slot of this query.
    fn key(&self) -> CacheKey;

    /// How long a result stays fresh.
    fn stale_after(&self, stale: &StaleTimes) -> Duration;

    /// Fetches and decodes the payload.
    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError>;
}

/// Freshness window per query family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleTimes {
    pub system_health: Duration,
    pub machine_health: Duration,
    pub alerts: Duration,
    pub current_status: Duration,
    pub operation_health: Duration,
    /// Custom-period statistics of every domain.
    pub period: Duration,
    pub today_summary: Duration,
    pub week_summary: Duration,
    pub month_summary: Duration,
    /// Station metadata (sites, station lists, cache status).
    pub stations: Duration,
}

impl StaleTimes {
    /// Freshness window of a fixed-period summary.
    pub fn summary(&self, period: SummaryPeriod) -> Duration {
        match period {
            SummaryPeriod::Today => self.today_summary,
            SummaryPeriod::Week => self.week_summary,
            SummaryPeriod::Month => self.month_summary,
        }
    }
}

impl Default for StaleTimes {
    fn default() -> Self {
        Self {
            system_health: Duration::from_secs(5),
            machine_health: Duration::from_secs(5),
            alerts: Duration::from_secs(30),
            current_status: Duration::from_secs(60),
            operation_health: Duration::from_secs(60),
            period: Duration::from_secs(5 * 60),
            today_summary: Duration::from_secs(5 * 60),
            week_summary: Duration::from_secs(10 * 60),
            month_summary: Duration::from_secs(15 * 60),
            stations: Duration::from_secs(5 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stale_times() {
        let stale = StaleTimes::default();
        assert_eq!(stale.system_health, Duration::from_secs(5));
        assert_eq!(stale.alerts, Duration::from_secs(30));
        assert_eq!(stale.current_status, Duration::from_secs(60));
        assert_eq!(stale.summary(SummaryPeriod::Today), Duration::from_secs(300));
        assert_eq!(stale.summary(SummaryPeriod::Week), Duration::from_secs(600));
        assert_eq!(stale.summary(SummaryPeriod::Month), Duration::from_secs(900));
    }
}
