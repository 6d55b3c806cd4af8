//! Monitor configuration.
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults,
//! 2. a TOML/YAML/JSON file (`pulse.*` in the working directory unless a
//!    path is given with `--config` or `PULSE_CONFIG`),
//! 3. environment variables prefixed with `PULSE_`, nested sections
//!    separated by `__` (e.g. `PULSE_POLL__INTERVAL_SECS=10`).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, Map};
use pulse_core::HttpTransportConfig;
use pulse_session::AuthConfig;
use pulse_sync::{CacheConfig, PollConfig, StaleTimes};
use serde::Deserialize;

use crate::error::MonitorError;

const DEFAULT_FILE: &str = "pulse";
const ENV_PREFIX: &str = "PULSE";

/// Complete monitor configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Base URL of the statistics and station metadata API.
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    /// File holding the persisted session token.
    pub token_path: PathBuf,
    /// Site to monitor. The first site of the catalog when unset.
    pub site: Option<String>,
    pub poll: PollSettings,
    pub stale: StaleSettings,
    pub cache: CacheSettings,
    pub auth: AuthSettings,
    /// Listener of the Prometheus exporter. No exporter when unset.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 10_000,
            token_path: PathBuf::from(".pulse/session.json"),
            site: None,
            poll: PollSettings::default(),
            stale: StaleSettings::default(),
            cache: CacheSettings::default(),
            auth: AuthSettings::default(),
            metrics_addr: None,
        }
    }
}

impl MonitorConfig {
    /// Loads the configuration from `path` (or the default file) and the
    /// process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        Self::load_from(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of
    /// the process environment when given.
    pub fn load_from(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, MonitorError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };

        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: Self = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects values the monitor cannot run with.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.api_base_url.trim().is_empty() {
            return Err(MonitorError::invalid_config(
                "api_base_url",
                "must not be empty",
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(MonitorError::invalid_config(
                "request_timeout_ms",
                "must be positive",
            ));
        }
        if self.poll.interval_secs == 0 {
            return Err(MonitorError::invalid_config(
                "poll.interval_secs",
                "must be positive",
            ));
        }
        if self.poll.backoff_multiplier < 1.0 {
            return Err(MonitorError::invalid_config(
                "poll.backoff_multiplier",
                "must be at least 1.0",
            ));
        }
        if self.cache.max_capacity == 0 {
            return Err(MonitorError::invalid_config(
                "cache.max_capacity",
                "must be positive",
            ));
        }
        Ok(())
    }

    pub fn transport(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            base_url: self.api_base_url.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}

/// Polling cadence and backoff of the monitoring subscriptions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    pub interval_secs: u64,
    pub max_failures: u32,
    pub backoff_multiplier: f64,
    pub max_backoff_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            interval_secs: poll.interval.as_secs(),
            max_failures: poll.max_failures,
            backoff_multiplier: poll.backoff_multiplier,
            max_backoff_secs: poll.max_backoff.as_secs(),
        }
    }
}

impl PollSettings {
    pub fn to_poll_config(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(self.interval_secs),
            max_failures: self.max_failures,
            backoff_multiplier: self.backoff_multiplier,
            max_backoff: Duration::from_secs(self.max_backoff_secs),
        }
    }
}

/// Freshness windows in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StaleSettings {
    pub system_health: u64,
    pub machine_health: u64,
    pub alerts: u64,
    pub current_status: u64,
    pub operation_health: u64,
    pub period: u64,
    pub today_summary: u64,
    pub week_summary: u64,
    pub month_summary: u64,
    pub stations: u64,
}

impl Default for StaleSettings {
    fn default() -> Self {
        let stale = StaleTimes::default();
        Self {
            system_health: stale.system_health.as_secs(),
            machine_health: stale.machine_health.as_secs(),
            alerts: stale.alerts.as_secs(),
            current_status: stale.current_status.as_secs(),
            operation_health: stale.operation_health.as_secs(),
            period: stale.period.as_secs(),
            today_summary: stale.today_summary.as_secs(),
            week_summary: stale.week_summary.as_secs(),
            month_summary: stale.month_summary.as_secs(),
            stations: stale.stations.as_secs(),
        }
    }
}

impl StaleSettings {
    pub fn to_stale_times(&self) -> StaleTimes {
        StaleTimes {
            system_health: Duration::from_secs(self.system_health),
            machine_health: Duration::from_secs(self.machine_health),
            alerts: Duration::from_secs(self.alerts),
            current_status: Duration::from_secs(self.current_status),
            operation_health: Duration::from_secs(self.operation_health),
            period: Duration::from_secs(self.period),
            today_summary: Duration::from_secs(self.today_summary),
            week_summary: Duration::from_secs(self.week_summary),
            month_summary: Duration::from_secs(self.month_summary),
            stations: Duration::from_secs(self.stations),
        }
    }
}

/// Bounds of the query cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_capacity: u64,
    pub time_to_idle_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let cache = CacheConfig::default();
        Self {
            max_capacity: cache.max_capacity,
            time_to_idle_secs: cache.time_to_idle_secs,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_capacity: self.max_capacity,
            time_to_idle_secs: self.time_to_idle_secs,
        }
    }
}

/// Sign-in settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// See [`AuthConfig::dev_admin_email`].
    pub dev_admin_email: Option<String>,
    /// Credentials used when no persisted session can be restored.
    pub email: Option<String>,
    pub password: Option<String>,
}

impl AuthSettings {
    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig {
            dev_admin_email: self.dev_admin_email.clone(),
        }
    }

    /// Configured credentials, when both are set.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        }
    }
}

/// Config file path from `--config <path>` / `--config=<path>`, falling
/// back to `env_path` (the `PULSE_CONFIG` variable).
pub fn config_path<I>(args: I, env_path: Option<String>) -> Option<PathBuf>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    env_path.filter(|p| !p.is_empty()).map(PathBuf::from)
}
