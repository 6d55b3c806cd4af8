//! Test helpers for pulse-monitor: an HTTP fake of the backend.

#![allow(dead_code, unused_imports)]

pub mod backend;
pub mod fixtures;

pub use backend::{FakeBackend, Hit};
pub use fixtures::*;

use std::path::Path;

use pulse_monitor::{AuthSettings, MonitorConfig, PollSettings};

/// Configuration pointing at `backend`, keeping the token under `dir`.
pub fn config_for(backend: &FakeBackend, dir: &Path) -> MonitorConfig {
    MonitorConfig {
        api_base_url: backend.base_url(),
        request_timeout_ms: 2_000,
        token_path: dir.join("session.json"),
        poll: PollSettings {
            interval_secs: 5,
            ..PollSettings::default()
        },
        auth: AuthSettings::default(),
        ..MonitorConfig::default()
    }
}
