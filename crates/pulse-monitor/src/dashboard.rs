//! The monitoring dashboard: site selection, live subscriptions and the
//! aggregated view.
//!
//! Rendering is left to the log. Every time a cache entry behind the view
//! changes the view is recomputed, and a summary is logged whenever it
//! differs from the previous one. The monitored window is the current local
//! day and moves to the next one at midnight.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use metrics::{counter, gauge};
use pulse_core::{ApiTransport, HttpTransport, PeriodParams};
use pulse_session::{FileTokenStore, LogNotifier, SessionManager, User};
use pulse_sync::{
    AlertCounts, HasRealData, MonitoringQueries, MonitoringView, QueryClient, SeriesStatus,
    StationCatalog,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::error::MonitorError;

/// The site being monitored and its stations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteSelection {
    /// `None` when no site is known; polling stays disabled.
    pub site: Option<String>,
    /// Station filter. Empty means every station of the backend.
    pub stations: Vec<String>,
}

impl SiteSelection {
    /// Picks the configured site, or the first site of the catalog.
    ///
    /// A configured site missing from a loaded catalog falls back to the
    /// first site. Without a catalog the configured site is trusted and
    /// left unfiltered.
    pub fn choose(configured: Option<&str>, catalog: Option<&StationCatalog>) -> Self {
        let Some(catalog) = catalog else {
            return Self {
                site: configured.map(str::to_string),
                stations: Vec::new(),
            };
        };

        let site = match configured {
            Some(site) if catalog.stations_by_site.contains_key(site) => Some(site.to_string()),
            Some(site) => {
                warn!(site, "Configured site is not in the station catalog");
                catalog.sites.first().cloned()
            },
            None => catalog.sites.first().cloned(),
        };

        let stations = site
            .as_deref()
            .map(|s| catalog.stations(s).to_vec())
            .unwrap_or_default();
        Self { site, stations }
    }
}

/// What the status bar shows. Logged when it changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub running: Option<usize>,
    pub total: Option<usize>,
    pub alerts: AlertCounts,
    pub has_real_data: HasRealData,
    /// Stations with at least one reading.
    pub reporting_stations: usize,
    /// Series whose last request failed.
    pub failing: Vec<&'static str>,
    pub loading: bool,
}

impl ViewSummary {
    pub fn from_view(view: &MonitoringView) -> Self {
        let failing = [
            ("system_health", view.system_health.error.is_some()),
            ("machine_health", view.machine_health.error.is_some()),
            ("alerts", view.alerts.error.is_some()),
            ("operation_status", view.operation_status.error.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, failed)| failed.then_some(name))
        .collect();

        Self {
            running: view.running_stations(),
            total: view.total_stations(),
            alerts: view.alert_counts,
            has_real_data: view.has_real_data,
            reporting_stations: view.stations.len(),
            failing,
            loading: view.is_loading(),
        }
    }
}

/// Outcome of a dashboard run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub selection: SiteSelection,
    /// Whether the backend passed its health check at start.
    pub backend_healthy: bool,
    /// Day of the last monitored window.
    pub day: Option<NaiveDate>,
    /// Number of distinct summaries observed.
    pub updates: usize,
    pub last: Option<ViewSummary>,
}

/// Headless monitoring dashboard.
pub struct MonitoringDashboard {
    config: MonitorConfig,
    client: QueryClient,
    session: SessionManager,
    clock: fn() -> NaiveDateTime,
}

impl MonitoringDashboard {
    /// Builds the dashboard over an HTTP transport.
    pub fn new(config: MonitorConfig) -> Result<Self, MonitorError> {
        let transport = HttpTransport::new(config.transport())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: MonitorConfig, transport: Arc<dyn ApiTransport>) -> Self {
        let client = QueryClient::new(transport.clone(), config.cache.to_cache_config())
            .with_stale_times(config.stale.to_stale_times());
        let session = SessionManager::new(
            transport,
            Arc::new(FileTokenStore::new(&config.token_path)),
            Arc::new(LogNotifier),
            config.auth.to_auth_config(),
        );

        Self {
            config,
            client,
            session,
            clock: local_now,
        }
    }

    /// Replaces the wall clock that decides the monitored day.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Restores the persisted session, signing in with the configured
    /// credentials when there is none. Failures are logged and notified.
    pub async fn sign_in(&self) -> Option<User> {
        if let Some(user) = self.session.restore().await {
            return Some(user);
        }
        let (email, password) = self.config.auth.credentials()?;
        self.session.login(email, password).await.ok()
    }

    /// Asks the backend for its health. A failure is logged and does not
    /// stop the dashboard.
    pub async fn check_backend(&self) -> bool {
        let transport = self.client.transport();
        match transport.health_check().await {
            Ok(()) => {
                debug!(transport = transport.name(), "Backend healthy");
                true
            },
            Err(e) => {
                warn!(transport = transport.name(), error = %e, "Backend health check failed");
                false
            },
        }
    }

    /// Loads the station catalog and picks the site to monitor.
    pub async fn select_site(&self) -> SiteSelection {
        let catalog = match StationCatalog::load(&self.client).await {
            Ok(catalog) => {
                debug!(
                    sites = catalog.sites.len(),
                    stations = catalog.station_count(),
                    valid = catalog.is_valid(),
                    "Station catalog loaded"
                );
                Some(catalog)
            },
            Err(e) => {
                warn!(error = %e, "Failed to load station catalog");
                None
            },
        };
        SiteSelection::choose(self.config.site.as_deref(), catalog.as_ref())
    }

    /// Monitors the selected site until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F) -> RunReport
    where
        F: Future<Output = ()>,
    {
        if let Some(user) = self.sign_in().await {
            info!(user_id = %user.id, "Session active");
        }

        let backend_healthy = self.check_backend().await;
        let selection = self.select_site().await;
        let enabled = selection.site.is_some();
        match &selection.site {
            Some(site) => info!(site, stations = selection.stations.len(), "Monitoring site"),
            None => warn!("No site available, monitoring paused"),
        }

        let poll = self.config.poll.to_poll_config();
        let stations = selection.stations.clone();
        let mut day = (self.clock)().date();
        let mut queries = MonitoringQueries::new(PeriodParams::for_day(day), &stations);
        let mut changes = self.client.cache().subscribe_changes();
        let mut _subscriptions = queries.subscribe(&self.client, poll, enabled);
        let mut report = RunReport {
            selection,
            backend_healthy,
            day: Some(day),
            ..RunReport::default()
        };

        let rollover = tokio::time::sleep(until_next_day(day, (self.clock)()));
        tokio::pin!(shutdown);
        tokio::pin!(rollover);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = &mut rollover => {
                    day = next_day(day, (self.clock)().date());
                    info!(%day, "Day changed, moving the monitored window");
                    queries = MonitoringQueries::new(PeriodParams::for_day(day), &stations);
                    _subscriptions = queries.subscribe(&self.client, poll, enabled);
                    report.day = Some(day);
                    let wait = until_next_day(day, (self.clock)());
                    rollover.as_mut().reset(tokio::time::Instant::now() + wait);
                },
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = MonitoringView::compute(&self.client, &queries);
                    let summary = ViewSummary::from_view(&view);
                    if report.last.as_ref() != Some(&summary) {
                        log_summary(report.selection.site.as_deref(), &summary, &view);
                        report.updates += 1;
                        report.last = Some(summary);
                    }
                },
            }
        }

        info!(
            updates = report.updates,
            hit_rate = self.client.cache().metrics().hit_rate(),
            "Monitoring stopped"
        );
        report
    }
}

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Time left until midnight at the end of `day`.
fn until_next_day(day: NaiveDate, now: NaiveDateTime) -> Duration {
    match day.succ_opt().and_then(|next| next.and_hms_opt(0, 0, 0)) {
        Some(midnight) => (midnight - now).to_std().unwrap_or(Duration::ZERO),
        None => ONE_DAY,
    }
}

/// The day after `day`, or `today` if the clock is already further.
fn next_day(day: NaiveDate, today: NaiveDate) -> NaiveDate {
    day.succ_opt().unwrap_or(day).max(today)
}

fn log_summary(site: Option<&str>, summary: &ViewSummary, view: &MonitoringView) {
    counter!("pulse_view_updates_total").increment(1);
    if let Some(running) = summary.running {
        gauge!("pulse_stations_running").set(running as f64);
    }
    gauge!("pulse_alerts_active").set(summary.alerts.total as f64);

    if summary.loading {
        debug!(site, "Waiting for first data");
        return;
    }

    info!(
        site,
        running = ?summary.running,
        total = ?summary.total,
        alerts = summary.alerts.total,
        critical = summary.alerts.critical,
        reporting = summary.reporting_stations,
        system_health = ?view.system_health.status,
        machine_health = ?view.machine_health.status,
        "Monitoring view updated"
    );
    if !summary.failing.is_empty() {
        warn!(site, series = ?summary.failing, "Some series failed to refresh");
    }
    if view.machine_health.status == SeriesStatus::Empty {
        debug!(site, "No machine health records in the window");
    }
}
