//! Queries of the station metadata API (`/api/v1/station-metadata`).

use std::time::Duration;

use async_trait::async_trait;
use pulse_core::envelope::{decode_body, decode_data};
use pulse_core::types::{
    SiteStations, SitesResponse, StationCacheStatus, StationsBySiteResponse,
};
use pulse_core::{ApiRequest, ApiTransport, DashboardError};
use serde_json::json;

use super::{Query, StaleTimes};
use crate::cache::CacheKey;

/// Cache domain of the station metadata API.
pub const STATIONS: &str = "stations";

const BASE_PATH: &str = "/api/v1/station-metadata";

/// Every known site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SitesQuery;

#[async_trait]
impl Query for SitesQuery {
    type Output = Vec<String>;

    fn key(&self) -> CacheKey {
        CacheKey::new(STATIONS, "sites")
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.stations
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        let request = ApiRequest::get(format!("{}/sites", BASE_PATH));
        let response: SitesResponse = decode_body(transport.send(&request).await?)?;
        Ok(response.sites)
    }
}

/// Station ids of one site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StationsBySiteQuery {
    pub site: String,
}

impl StationsBySiteQuery {
    pub fn new(site: impl Into<String>) -> Self {
        Self { site: site.into() }
    }
}

#[async_trait]
impl Query for StationsBySiteQuery {
    type Output = Vec<String>;

    fn key(&self) -> CacheKey {
        CacheKey::for_params(STATIONS, "list", &json!({ "site": self.site }))
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.stations
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        if self.site.trim().is_empty() {
            return Err(DashboardError::validation("site", "site cannot be empty"));
        }
        let request = ApiRequest::get(format!(
            "{}/stations/{}",
            BASE_PATH,
            urlencoding::encode(&self.site)
        ));
        let response: StationsBySiteResponse = decode_body(transport.send(&request).await?)?;
        Ok(response
            .stations
            .iter()
            .map(|station| station.id().to_string())
            .collect())
    }
}

/// Every site with its stations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AllStationsQuery;

#[async_trait]
impl Query for AllStationsQuery {
    type Output = Vec<SiteStations>;

    fn key(&self) -> CacheKey {
        CacheKey::new(STATIONS, "list")
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.stations
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        let request = ApiRequest::get(format!("{}/stations", BASE_PATH));
        decode_data(transport.send(&request).await?)
    }
}

/// State of the metadata service's own cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StationCacheStatusQuery;

#[async_trait]
impl Query for StationCacheStatusQuery {
    type Output = StationCacheStatus;

    fn key(&self) -> CacheKey {
        CacheKey::new(STATIONS, "cache")
    }

    fn stale_after(&self, stale: &StaleTimes) -> Duration {
        stale.stations
    }

    async fn fetch(&self, transport: &dyn ApiTransport) -> Result<Self::Output, DashboardError> {
        let request = ApiRequest::get(format!("{}/cache-status", BASE_PATH));
        decode_data(transport.send(&request).await?)
    }
}
