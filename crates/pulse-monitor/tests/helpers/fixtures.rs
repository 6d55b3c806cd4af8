//! Backend payloads.

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use super::FakeBackend;

pub const SYSTEM_HEALTH: &str = "/api/v1/health-stats/system-health";
pub const MACHINE_HEALTH: &str = "/api/v1/health-stats/machine-health";
pub const ALERTS: &str = "/api/v1/health-stats/alerts";
pub const CURRENT_STATUS: &str = "/api/v1/operation-stats/current-status";
pub const ALL_STATIONS: &str = "/api/v1/station-metadata/stations";
pub const STATION_CACHE_STATUS: &str = "/api/v1/station-metadata/cache-status";
pub const USERS: &str = "/api/v1/users";
pub const HEALTH: &str = "/health";

pub fn backend_health(status: &str) -> Value {
    json!({ "status": status, "database": "connected", "timestamp": "2024-01-01T08:00:00" })
}

pub fn stations_listing() -> Value {
    json!({
        "success": true,
        "data": [
            { "site": "Hwaseong", "stations": ["JSW", "R&T1"] },
            { "site": "Ansan", "stations": ["AS1"] }
        ]
    })
}

pub fn empty_listing() -> Value {
    json!({ "success": true, "data": [] })
}

pub fn cache_status() -> Value {
    json!({
        "success": true,
        "data": { "last_updated": "2024-01-01T08:00:00", "is_valid": true, "size": 3 }
    })
}

pub fn system_health() -> Value {
    json!({
        "success": true,
        "results": [
            {
                "timestamp": { "$date": "2024-01-01T08:00:00Z" },
                "metadata": { "station_id": "JSW" },
                "usage": { "cpu": 41.0, "gpu": 70.0, "ram": 55.0 },
                "temp": { "cpu": 60.0, "gpu": 71.0, "camera_left": 40.0, "camera_right": 41.0 }
            },
            {
                "timestamp": { "$date": "2024-01-01T08:00:05Z" },
                "metadata": { "station_id": "JSW" },
                "usage": { "cpu": 47.0, "gpu": 72.0, "ram": 56.0 },
                "temp": { "cpu": 61.0, "gpu": 72.0, "camera_left": 40.0, "camera_right": 41.0 }
            }
        ]
    })
}

pub fn machine_health() -> Value {
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

pub fn alerts() -> Value {
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

pub fn current_status() -> Value {
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
                },
                "R&T1": {
                    "station_id": "R&T1",
                    "current_state": false,
                    "last_updated": "2024-01-01T07:40:00",
                    "status": "stopped"
                }
            }
        }
    })
}

/// Serves the station catalog and every monitoring series.
pub fn serve_site(backend: &FakeBackend) {
    backend.get(ALL_STATIONS, stations_listing());
    backend.get(STATION_CACHE_STATUS, cache_status());
    backend.get(SYSTEM_HEALTH, system_health());
    backend.get(MACHINE_HEALTH, machine_health());
    backend.get(ALERTS, alerts());
    backend.get(CURRENT_STATUS, current_status());
}

/// Serves user 7 with the given password.
pub fn serve_user(backend: &FakeBackend, email: &str, password: &str) {
    backend.get(
        USERS,
        json!({ "data": [{ "id": 7, "email": email, "name": "Operator", "role": "user", "password": password }] }),
    );
    backend.get(
        &format!("{}/7", USERS),
        json!({ "id": 7, "email": email, "name": "Operator", "role": "user", "is_active": true }),
    );
}

pub fn fail(backend: &FakeBackend, path: &str) {
    backend.respond(
        Method::GET,
        path,
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "detail": "database unavailable" }),
    );
}
