//! Pulse Monitor - Headless Station Pulse dashboard
//!
//! Wires the query cache, the session layer and the monitoring view into a
//! process that watches one site and logs its status as it changes.
//!
//! # Example
//!
//! ```no_run
//! use pulse_monitor::{MonitorConfig, MonitoringDashboard};
//!
//! # async fn example() -> Result<(), pulse_monitor::MonitorError> {
//! let config = MonitorConfig::load(None)?;
//! let dashboard = MonitoringDashboard::new(config)?;
//!
//! let report = dashboard
//!     .run_until(tokio::time::sleep(std::time::Duration::from_secs(60)))
//!     .await;
//! println!("{} view updates", report.updates);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dashboard;
pub mod error;
pub mod telemetry;

pub use config::{
    AuthSettings, CacheSettings, MonitorConfig, PollSettings, StaleSettings, config_path,
};
pub use dashboard::{MonitoringDashboard, RunReport, SiteSelection, ViewSummary};
pub use error::MonitorError;
pub use telemetry::{init_metrics, init_tracing};
