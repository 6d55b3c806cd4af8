//! Station Pulse monitor binary.

use anyhow::Context;
use pulse_monitor::{MonitorConfig, MonitoringDashboard, config_path, init_metrics, init_tracing};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let path = config_path(std::env::args().skip(1), std::env::var("PULSE_CONFIG").ok());
    let config = MonitorConfig::load(path.as_deref()).context("failed to load configuration")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api_base_url,
        site = ?config.site,
        "Starting Station Pulse monitor"
    );

    if let Some(addr) = config.metrics_addr {
        init_metrics(addr).context("failed to start metrics exporter")?;
    }

    let dashboard = MonitoringDashboard::new(config).context("failed to build API client")?;
    let report = dashboard.run_until(shutdown_signal()).await;

    info!(
        site = ?report.selection.site,
        updates = report.updates,
        "Station Pulse monitor stopped"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
