//! End-to-end runs of the dashboard against the fake backend.

mod helpers;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use helpers::*;
use pulse_core::{HttpTransport, HttpTransportConfig};
use pulse_monitor::{MonitorConfig, MonitoringDashboard};
use pulse_session::SessionState;
use tempfile::TempDir;
use tokio::time::sleep;

const RUN_FOR: Duration = Duration::from_millis(1_500);

fn dashboard(config: MonitorConfig) -> MonitoringDashboard {
    MonitoringDashboard::new(config).unwrap()
}

#[tokio::test]
async fn test_monitors_first_site_of_catalog() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    let dir = TempDir::new().unwrap();

    let report = dashboard(config_for(&backend, dir.path()))
        .run_until(sleep(RUN_FOR))
        .await;

    assert_eq!(report.selection.site.as_deref(), Some("Hwaseong"));
    assert_eq!(report.selection.stations, vec!["JSW", "R&T1"]);

    let summary = report.last.expect("view summary");
    assert!(!summary.loading);
    assert!(summary.has_real_data.system_health);
    assert!(summary.has_real_data.machine_health);
    assert!(summary.has_real_data.alerts);
    assert!(summary.has_real_data.operation_status);
    assert_eq!(summary.running, Some(1));
    assert_eq!(summary.total, Some(2));
    assert_eq!(summary.alerts.critical, 1);
    assert!(summary.failing.is_empty());
}

#[tokio::test]
async fn test_backend_health_is_checked_once() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    backend.get(HEALTH, backend_health("healthy"));
    let dir = TempDir::new().unwrap();

    let report = dashboard(config_for(&backend, dir.path()))
        .run_until(sleep(RUN_FOR))
        .await;

    assert!(report.backend_healthy);
    assert_eq!(backend.count(HEALTH), 1);
}

#[tokio::test]
async fn test_unhealthy_backend_is_still_monitored() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    backend.get(HEALTH, backend_health("unhealthy"));
    let dir = TempDir::new().unwrap();

    let report = dashboard(config_for(&backend, dir.path()))
        .run_until(sleep(RUN_FOR))
        .await;

    assert!(!report.backend_healthy);
    assert!(report.last.expect("view summary").has_real_data.system_health);
}

#[tokio::test]
async fn test_each_series_is_fetched_once_per_interval() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    let dir = TempDir::new().unwrap();

    dashboard(config_for(&backend, dir.path()))
        .run_until(sleep(RUN_FOR))
        .await;

    for path in [SYSTEM_HEALTH, MACHINE_HEALTH, ALERTS, CURRENT_STATUS] {
        assert_eq!(backend.count(path), 1, "{} fetched more than once", path);
    }
}

#[tokio::test]
async fn test_requests_are_filtered_by_site_stations() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    let dir = TempDir::new().unwrap();
    let config = MonitorConfig {
        site: Some("Ansan".to_string()),
        ..config_for(&backend, dir.path())
    };

    let report = dashboard(config).run_until(sleep(RUN_FOR)).await;

    assert_eq!(report.selection.stations, vec!["AS1"]);
    let health = &backend.hits_for(SYSTEM_HEALTH)[0];
    assert!(health.query.contains("station_ids=AS1"));
    assert!(health.query.contains("start_date="));
    let status = &backend.hits_for(CURRENT_STATUS)[0];
    assert_eq!(status.query, "station_ids=AS1");
}

#[tokio::test]
async fn test_empty_catalog_pauses_polling() {
    let backend = FakeBackend::start().await;
    backend.get(ALL_STATIONS, empty_listing());
    backend.get(STATION_CACHE_STATUS, cache_status());
    let dir = TempDir::new().unwrap();

    let report = dashboard(config_for(&backend, dir.path()))
        .run_until(sleep(Duration::from_millis(300)))
        .await;

    assert_eq!(report.selection.site, None);
    assert_eq!(report.updates, 0);
    assert_eq!(backend.count(SYSTEM_HEALTH), 0);
    assert_eq!(backend.count(CURRENT_STATUS), 0);
}

#[tokio::test]
async fn test_failed_series_does_not_hide_the_others() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    fail(&backend, MACHINE_HEALTH);
    let dir = TempDir::new().unwrap();

    let report = dashboard(config_for(&backend, dir.path()))
        .run_until(sleep(RUN_FOR))
        .await;

    let summary = report.last.expect("view summary");
    assert!(summary.has_real_data.system_health);
    assert!(!summary.has_real_data.machine_health);
    assert_eq!(summary.failing, vec!["machine_health"]);
}

#[tokio::test]
async fn test_sign_in_persists_and_restores_session() {
    let backend = FakeBackend::start().await;
    serve_user(&backend, "operator@plant.com", "secret");
    let dir = TempDir::new().unwrap();

    let mut config = config_for(&backend, dir.path());
    config.auth.email = Some("operator@plant.com".to_string());
    config.auth.password = Some("secret".to_string());

    let first = dashboard(config.clone());
    let user = first.sign_in().await.expect("signed in");
    assert_eq!(user.id, "7");
    assert_eq!(first.session().state(), SessionState::Authenticated);

    let stored = fs::read_to_string(&config.token_path).unwrap();
    assert!(stored.contains("token-7"));

    let second = dashboard(config);
    second.sign_in().await.expect("restored");
    assert_eq!(second.session().token().as_deref(), Some("token-7"));
    // The listing by email only happened for the first sign-in.
    assert_eq!(backend.count(USERS), 1);
}

#[tokio::test]
async fn test_wrong_password_leaves_dashboard_signed_out() {
    let backend = FakeBackend::start().await;
    serve_user(&backend, "operator@plant.com", "secret");
    let dir = TempDir::new().unwrap();

    let mut config = config_for(&backend, dir.path());
    config.auth.email = Some("operator@plant.com".to_string());
    config.auth.password = Some("guess".to_string());

    let dashboard = dashboard(config.clone());
    assert!(dashboard.sign_in().await.is_none());
    assert_eq!(dashboard.session().state(), SessionState::Unauthenticated);
    assert!(!config.token_path.exists());
}

#[tokio::test]
async fn test_transport_reaches_fake_backend() {
    let backend = FakeBackend::start().await;
    serve_site(&backend);
    let transport = Arc::new(
        HttpTransport::new(HttpTransportConfig::new(backend.base_url())).unwrap(),
    );
    let dir = TempDir::new().unwrap();

    let dashboard =
        MonitoringDashboard::with_transport(config_for(&backend, dir.path()), transport);
    let selection = dashboard.select_site().await;

    assert_eq!(selection.site.as_deref(), Some("Hwaseong"));
    assert_eq!(backend.count(ALL_STATIONS), 1);
}
