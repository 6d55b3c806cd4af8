//! Station metadata payloads.

use serde::{Deserialize, Serialize};

/// Whether a station is in service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Active,
    Inactive,
}

/// A station as listed by the metadata service.
///
/// Per-site listings send bare ids; the full listing may send records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StationRef {
    Id(String),
    Detailed {
        id: String,
        #[serde(default)]
        site_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        status: Option<StationStatus>,
    },
}

impl StationRef {
    /// Returns the station id regardless of form.
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Detailed { id, .. } => id,
        }
    }
}

/// Response of `GET /station-metadata/sites`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitesResponse {
    #[serde(default)]
    pub sites: Vec<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Response of `GET /station-metadata/stations/{site}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StationsBySiteResponse {
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub stations: Vec<StationRef>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// One site with its stations, as returned by the full listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStations {
    pub site: String,
    #[serde(default)]
    pub stations: Vec<StationRef>,
}

impl SiteStations {
    /// Returns the ids of the site's stations.
    pub fn station_ids(&self) -> Vec<String> {
        self.stations.iter().map(|s| s.id().to_string()).collect()
    }
}

/// State of the metadata service's own cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationCacheStatus {
    pub last_updated: String,
    pub is_valid: bool,
    #[serde(default)]
    pub size: usize,
}
