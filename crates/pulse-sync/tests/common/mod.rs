//! Shared helpers for pulse-sync integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_core::{ApiRequest, ApiTransport, DashboardError};
use pulse_sync::{CacheConfig, QueryClient};
use serde_json::{Value, json};

/// Transport double answering from canned responses keyed by path.
///
/// Unknown paths answer `NotFound`. Every request is recorded.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, Result<Value, DashboardError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.responses.lock().insert(path.to_string(), Ok(body));
    }

    pub fn fail(&self, path: &str, error: DashboardError) {
        self.responses.lock().insert(path.to_string(), Err(error));
    }

    /// Makes every response take `delay` (virtual time under a paused clock).
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.path() == path)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, DashboardError> {
        self.requests.lock().push(request.clone());

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().get(request.path()).cloned();
        response.unwrap_or_else(|| Err(DashboardError::not_found(request.path())))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A client over `transport` with default freshness windows.
pub fn client(transport: &Arc<MockTransport>) -> QueryClient {
    QueryClient::new(transport.clone(), CacheConfig::default())
}

pub const SYSTEM_HEALTH: &str = "/api/v1/health-stats/system-health";
pub const MACHINE_HEALTH: &str = "/api/v1/health-stats/machine-health";
pub const ALERTS: &str = "/api/v1/health-stats/alerts";
pub const CURRENT_STATUS: &str = "/api/v1/operation-stats/current-status";
pub const STATS_PERIOD: &str = "/api/v1/stats/period";
pub const ALL_STATIONS: &str = "/api/v1/station-metadata/stations";
pub const STATION_CACHE_STATUS: &str = "/api/v1/station-metadata/cache-status";
pub const REFRESH_STATIONS: &str = "/api/v1/station-metadata/refresh-cache";
pub const CLEAR_OPERATION_CACHE: &str = "/api/v1/operation-stats/cache/clear";
pub const INVALIDATE_OPERATION_CACHE: &str = "/api/v1/operation-stats/cache/invalidate";

pub fn system_health_body(station: &str, cpu: f64) -> Value {
    json!({
        "success": true,
        "results": [{
            "_id": { "$oid": "65a1f0000000000000000001" },
            "timestamp": { "$date": "2024-01-01T08:00:00Z" },
            "metadata": { "station_id": station },
            "usage": { "cpu": cpu, "gpu": 70.0, "ram": 55.0 },
            "temp": { "cpu": 60.0, "gpu": 71.0, "camera_left": 40.0, "camera_right": 41.0 }
        }]
    })
}

pub fn machine_health_body() -> Value {
    json!({
        "success": true,
        "results": [{
            "timestamp": "2024-01-01T08:00:00",
            "station_id": "JSW",
            "vacuum": -61.0,
            "conveyor_speed": 0.4
        }]
    })
}

pub fn alerts_body() -> Value {
    json!({
        "success": true,
        "results": [{
            "timestamp": "2024-01-01T08:00:00",
            "station_id": "JSW",
            "severity": "critical",
            "type": "gpu_temperature",
            "details": { "component": "gpu", "current_temp": 92.0, "threshold_temp": 85.0 }
        }]
    })
}

pub fn current_status_body() -> Value {
    json!({
        "success": true,
        "data": {
            "current_time": "2024-01-01T08:00:00",
            "stations": {
                "JSW": {
                    "station_id": "JSW",
                    "current_state": true,
                    "last_updated": "2024-01-01T07:59:00",
                    "status": "running"
                }
            }
        }
    })
}

pub fn stats_period_body() -> Value {
    json!({
        "success": true,
        "period": { "start_date": "2024-01-01T00:00:00", "end_date": "2024-01-01T23:59:59" },
        "picking_attempts": { "total": 10, "by_category": { "PET": 10 } },
        "detected_objects": { "total": 12, "by_category": { "PET": 12 } },
        "daily_trends": []
    })
}

pub fn all_stations_body() -> Value {
    json!({
        "success": true,
        "data": [
            { "site": "Hwaseong", "stations": ["JSW", "R&T1"] },
            { "site": "Ansan", "stations": ["AS1"] }
        ]
    })
}

pub fn station_cache_status_body() -> Value {
    json!({
        "success": true,
        "data": { "last_updated": "2024-01-01T08:00:00", "is_valid": true, "size": 3 }
    })
}

pub fn ack_body() -> Value {
    json!({ "success": true, "message": "ok" })
}
