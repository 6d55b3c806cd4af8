//! Server-side cache commands and the local invalidation they trigger.
//!
//! Local entries are invalidated only after the backend acknowledged the
//! command. A failed command leaves the cache untouched.

use pulse_core::{Acknowledgement, ApiRequest, DashboardError};
use serde_json::json;
use tracing::info;

use crate::client::QueryClient;
use crate::query::{OPERATION_STATS, STATIONS};

const STATION_METADATA_PATH: &str = "/api/v1/station-metadata";
const OPERATION_STATS_PATH: &str = "/api/v1/operation-stats";

impl QueryClient {
    /// Asks the metadata service to reload its station cache, then marks
    /// every local `stations` entry stale.
    pub async fn refresh_station_cache(&self) -> Result<Acknowledgement, DashboardError> {
        let request = ApiRequest::post(format!("{}/refresh-cache", STATION_METADATA_PATH));
        let ack = Acknowledgement::decode(self.transport().send(&request).await?)?;

        let result = self.cache().invalidate_prefix(STATIONS, None);
        info!(invalidated = result.count, "Station cache refreshed");
        Ok(ack)
    }

    /// Clears the operation statistics cache on the server, then marks
    /// every local `operation-stats` entry stale.
    pub async fn clear_operation_cache(&self) -> Result<Acknowledgement, DashboardError> {
        let request = ApiRequest::post(format!("{}/cache/clear", OPERATION_STATS_PATH));
        let ack = Acknowledgement::decode(self.transport().send(&request).await?)?;

        let result = self.cache().invalidate_prefix(OPERATION_STATS, None);
        info!(invalidated = result.count, "Operation cache cleared");
        Ok(ack)
    }

    /// Drops one server-side cache key of the operation statistics service.
    ///
    /// Server keys do not map onto local keys, so every local
    /// `operation-stats` entry is marked stale.
    pub async fn invalidate_operation_cache(
        &self,
        cache_key: &str,
    ) -> Result<Acknowledgement, DashboardError> {
        if cache_key.trim().is_empty() {
            return Err(DashboardError::validation(
                "cache_key",
                "cache key cannot be empty",
            ));
        }

        let request = ApiRequest::post(format!("{}/cache/invalidate", OPERATION_STATS_PATH))
            .json(json!({ "cache_key": cache_key }));
        let ack = Acknowledgement::decode(self.transport().send(&request).await?)?;

        let result = self.cache().invalidate_prefix(OPERATION_STATS, None);
        info!(
            cache_key,
            invalidated = result.count,
            "Operation cache key invalidated"
        );
        Ok(ack)
    }
}
