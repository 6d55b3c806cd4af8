//! Queries of the health statistics API (`/api/v1/health-stats`).

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::envelope::{decode_body, decode_data, decode_results};
use pulse_core::types::{
    AlertRecord, MachineHealthRecord, PeriodHealthStatistics, ProductionSummary,
    SystemHealthRecord,
};
use pulse_core::{
    ApiRequest, ApiTransport, DashboardError, PeriodParams, StationFilter, SummaryPeriod,
};

use super::{Query, StaleTimes};
use crate::cache::CacheKey;

/// Cache domain of the health statistics API.
pub const HEALTH_STATS: &str = "health-stats";

const BASE_PATH: &str = "/api/v1/health-stats";

async fn fetch_window<T>(
    transport: &dyn ApiTransport,
    operation: &str,
    params: &PeriodParams,
) -> Result<Vec<T>, DashboardError>
where
    T: serde::de::DeserializeOwned + Send,
{
    params.validate()?;
    let request = params.apply(ApiRequest::get(format!("{}/{}", BASE_PATH, operation)));
    decode_results(transport.send(&request).await?)
}

/// System health samples (CPU/GPU/RAM usage and temperatures) in a window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemHealthQuery {
    pub params: PeriodParams,
}

impl SystemHealthQuery {
    pub fn new(params: PeriodParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for SystemHealthQuery {
    type Output = Vec<SystemHealthRecord>;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(HEALTH_STATS, "system-health", &self.params)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.system_health
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        fetch_window(transport, "system-health", &self.params).await
    }
}

/// Machine health samples (vacuum, conveyor speed) in a window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineHealthQuery {
    pub params: PeriodParams,
}

impl MachineHealthQuery {
    pub fn new(params: PeriodParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for MachineHealthQuery {
    type Output = Vec<MachineHealthRecord>;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(HEALTH_STATS, "machine-health", &self.params)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.machine_health
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        fetch_window(transport, "machine-health", &self.params).await
    }
}

/// Alerts raised in a window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertsQuery {
    pub params: PeriodParams,
}

impl AlertsQuery {
    pub fn new(params: PeriodParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for AlertsQuery {
    type Output = Vec<AlertRecord>;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(HEALTH_STATS, "alerts", &self.params)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.alerts
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        fetch_window(transport, "alerts", &self.params).await
    }
}

/// Aggregated health statistics for a window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HealthPeriodQuery {
    pub params: PeriodParams,
}

impl HealthPeriodQuery {
    pub fn new(params: PeriodParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for HealthPeriodQuery {
    type Output = PeriodHealthStatistics;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(HEALTH_STATS, "period", &self.params)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.period
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        self.params.validate()?;
        let request = self
            .params
            .apply(ApiRequest::get(format!("{}/period", BASE_PATH)));
        decode_body(transport.send(&request).await?)
    }
}

/// Today/week/month production summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HealthSummaryQuery {
    pub period: SummaryPeriod,
    pub filter: StationFilter,
}

impl HealthSummaryQuery {
    pub fn new(period: SummaryPeriod, filter: StationFilter) -> Self {
        Self { period, filter }
    }
}

#[async_trait]
impl Query for HealthSummaryQuery {
    type Output = ProductionSummary;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(HEALTH_STATS, self.period.operation(), &self.filter)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.summary(self.period)
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        let request = self.filter.apply(ApiRequest::get(format!(
            "{}/summary/{}",
            BASE_PATH,
            self.period.path_segment()
        )));
        decode_data(transport.send(&request).await?)
    }
}
