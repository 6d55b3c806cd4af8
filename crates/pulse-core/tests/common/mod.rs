#![allow(dead_code)]
use serde_json::{Value, json};

/// Parses a JSON fixture. Panics on invalid JSON (intended for tests).
pub fn fixture(json: &str) -> Value {
    serde_json::from_str(json).expect("Failed to parse test fixture")
}

/// A `system-health` response as served by the time-series store.
pub fn system_health_response() -> Value {
    json!({
        "success": true,
        "results": [
            {
                "_id": { "$oid": "65a1f0000000000000000001" },
                "timestamp": { "$date": "2024-01-01T08:00:00Z" },
                "metadata": { "station_id": "JSW" },
                "usage": { "cpu": 41.5, "gpu": 70.0, "ram": 55.2 },
                "temp": { "cpu": 60.0, "gpu": 71.0, "camera_left": 40.0, "camera_right": 41.0 }
            },
            {
                "_id": { "$oid": "65a1f0000000000000000002" },
                "timestamp": { "$date": "2024-01-01T08:00:05Z" },
                "metadata": { "station_id": "JSW" },
                "usage": { "cpu": 43.0, "gpu": 72.5, "ram": 55.0 },
                "temp": { "cpu": 61.0, "gpu": 72.0, "camera_left": 40.0, "camera_right": 41.5 }
            }
        ]
    })
}

/// A `today` summary response.
pub fn today_summary_response() -> Value {
    json!({
        "success": true,
        "data": {
            "date": "2024-01-01",
            "total_picking_attempts": 320,
            "total_detected_objects": 400,
            "picking_rate": 80.0,
            "picking_attempts": { "total": 320, "by_category": { "PET": 200, "CAN": 120 } },
            "detected_objects": { "total": 400, "by_category": { "PET": 250, "CAN": 150 } },
            "stations_summary": ["JSW", "R&T1"]
        }
    })
}
