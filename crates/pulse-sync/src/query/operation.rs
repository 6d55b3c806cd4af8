//! Queries of the operation statistics API (`/api/v1/operation-stats`).

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::envelope::{decode_body, decode_data};
use pulse_core::types::{CurrentOperationStatus, OperationServiceHealth, OperationSummary};
use pulse_core::{
    ApiRequest, ApiTransport, CurrentStatusParams, DashboardError, OperationPeriodParams,
    StationIdFilter, SummaryPeriod,
};

use super::{Query, StaleTimes};
use crate::cache::CacheKey;

/// Cache domain of the operation statistics API.
pub const OPERATION_STATS: &str = "operation-stats";

const BASE_PATH: &str = "/api/v1/operation-stats";

/// Current run state of the given stations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CurrentStatusQuery {
    pub params: CurrentStatusParams,
}

impl CurrentStatusQuery {
    pub fn new(params: CurrentStatusParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for CurrentStatusQuery {
    type Output = CurrentOperationStatus;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(OPERATION_STATS, "current-status", &self.params)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.current_status
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        let request = self
            .params
            .apply(ApiRequest::get(format!("{}/current-status", BASE_PATH)));
        decode_data(transport.send(&request).await?)
    }
}

/// Today/week/month uptime summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationSummaryQuery {
    pub period: SummaryPeriod,
    pub filter: StationIdFilter,
}

impl OperationSummaryQuery {
    pub fn new(period: SummaryPeriod, filter: StationIdFilter) -> Self {
        Self { period, filter }
    }
}

#[async_trait]
impl Query for OperationSummaryQuery {
    type Output = OperationSummary;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(OPERATION_STATS, self.period.operation(), &self.filter)
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

/// Uptime statistics for a custom window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationPeriodQuery {
    pub params: OperationPeriodParams,
}

impl OperationPeriodQuery {
    pub fn new(params: OperationPeriodParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for OperationPeriodQuery {
    type Output = OperationSummary;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(OPERATION_STATS, "period", &self.params)
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.period
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        self.params.validate()?;
        let request = self
            .params
            .apply(ApiRequest::get(format!("{}/period", BASE_PATH)));
        decode_data(transport.send(&request).await?)
    }
}

/// Health of the operation statistics service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OperationHealthQuery;

#[async_trait]
impl Query for OperationHealthQuery {
    type Output = OperationServiceHealth;

    fn key(&self) -> CacheKey {
        CacheKey::new(OPERATION_STATS, "health")
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.operation_health
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        let request = ApiRequest::get(format!("{}/health", BASE_PATH));
        decode_body(transport.send(&request).await?)
    }
}
