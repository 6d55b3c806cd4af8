//! Queries of the picking/detection statistics API (`/api/v1/stats`).

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::envelope::{decode_body, decode_data};
use pulse_core::types::{PeriodStatistics, ProductionSummary};
use pulse_core::{
    ApiRequest, ApiTransport, DashboardError, PeriodStatsParams, StationFilter, SummaryPeriod,
};

use super::{Query, StaleTimes};
use crate::cache::CacheKey;

/// Cache domain of the statistics API.
pub const STATS: &str = "stats";

const BASE_PATH: &str = "/api/v1/stats";

/// Picking and detection statistics for a custom window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsPeriodQuery {
    pub params: PeriodStatsParams,
}

impl StatsPeriodQuery {
    pub fn new(params: PeriodStatsParams) -> Self {
        Self { params }
    }
}

#[async_trait]
impl Query for StatsPeriodQuery {
    type Output = PeriodStatistics;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(STATS, "period", &self.params)
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

/// Today/week/month picking and detection summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsSummaryQuery {
    pub period: SummaryPeriod,
    pub filter: StationFilter,
}

impl StatsSummaryQuery {
    pub fn new(period: SummaryPeriod, filter: StationFilter) -> Self {
        Self { period, filter }
    }
}

#[async_trait]
impl Query for StatsSummaryQuery {
    type Output = ProductionSummary;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(STATS, self.period.operation(), &self.filter)
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
