//! Tracing and metrics setup.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::MonitorError;

/// Histogram buckets of API fetch durations, in seconds.
const FETCH_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Installs the Prometheus recorder and its HTTP listener on `addr`.
///
/// Must be called from within the Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MonitorError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(FETCH_BUCKETS)?
        .install()?;

    pulse_sync::register_cache_metrics();
    register_monitor_metrics();

    info!(%addr, "Metrics exporter listening");
    Ok(())
}

fn register_monitor_metrics() {
    metrics::describe_counter!(
        "pulse_view_updates_total",
        "Monitoring view changes observed by the dashboard"
    );
    metrics::describe_gauge!("pulse_stations_running", "Stations currently running");
    metrics::describe_gauge!("pulse_alerts_active", "Alerts in the monitored window");
}
