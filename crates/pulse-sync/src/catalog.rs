//! Station catalog: sites and their stations.

use indexmap::IndexMap;
use pulse_core::DashboardError;
use pulse_core::types::{SiteStations, StationCacheStatus};
use tracing::{debug, warn};

use crate::client::QueryClient;
use crate::query::{AllStationsQuery, StationCacheStatusQuery};

/// Sites and their stations, plus the metadata service's cache state.
///
/// Validity is what the server reports, not a local TTL: after
/// [`refresh_station_catalog`] the catalog is rebuilt from a freshly
/// reloaded server cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StationCatalog {
    /// Sites in the order the server lists them.
    pub sites: Vec<String>,
    pub stations_by_site: IndexMap<String, Vec<String>>,
    /// `None` when the cache status could not be fetched.
    pub cache_status: Option<StationCacheStatus>,
}

impl StationCatalog {
    /// Loads the catalog through the query cache.
    ///
    /// # Errors
    ///
    /// Fails when the station listing fails. A failed cache status
    /// request only leaves `cache_status` empty.
    pub async fn load(client: &QueryClient) -> Result<Self, DashboardError> {
        let (listing, status) = tokio::join!(
            client.fetch(&AllStationsQuery),
            client.fetch(&StationCacheStatusQuery)
        );

        let cache_status = match status {
            Ok(status) => Some(status.as_ref().clone()),
            Err(e) => {
                warn!(error = %e, "Station cache status unavailable");
                None
            },
        };

        let catalog = Self::from_parts(&listing?, cache_status);
        debug!(
            sites = catalog.sites.len(),
            stations = catalog.station_count(),
            "Station catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_parts(listing: &[SiteStations], cache_status: Option<StationCacheStatus>) -> Self {
        let stations_by_site: IndexMap<String, Vec<String>> = listing
            .iter()
            .map(|site| (site.site.clone(), site.station_ids()))
            .collect();

        Self {
            sites: stations_by_site.keys().cloned().collect(),
            stations_by_site,
            cache_status,
        }
    }

    /// Stations of `site`; empty for an unknown site.
    pub fn stations(&self, site: &str) -> &[String] {
        self.stations_by_site
            .get(site)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn station_count(&self) -> usize {
        self.stations_by_site.values().map(Vec::len).sum()
    }

    /// True when the server confirmed its cache is valid.
    pub fn is_valid(&self) -> bool {
        self.cache_status.as_ref().is_some_and(|s| s.is_valid)
    }

    /// Server-side last update of the station data, if known.
    pub fn last_updated(&self) -> Option<&str> {
        self.cache_status.as_ref().map(|s| s.last_updated.as_str())
    }
}

/// Reloads the server-side station cache and rebuilds the catalog.
pub async fn refresh_station_catalog(
    client: &QueryClient,
) -> Result<StationCatalog, DashboardError> {
    client.refresh_station_cache().await?;
    StationCatalog::load(client).await
}
