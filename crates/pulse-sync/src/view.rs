//! Aggregation of the monitoring series into one view.
//!
//! The monitoring screen combines four independently cached series:
//! system health, machine health, alerts and the current operation state.
//! Each may be missing, loading, failed or present, and [`MonitoringView`]
//! is a pure function of their current snapshots. Recompute it whenever
//! [`QueryCache::subscribe_changes`](crate::cache::QueryCache::subscribe_changes)
//! fires.

use std::collections::BTreeMap;
use std::sync::Arc;

use pulse_core::types::{
    AlertRecord, CurrentOperationStatus, MachineHealthRecord, Severity, SystemHealthRecord,
};
use pulse_core::{CurrentStatusParams, DashboardError, MongoDate, PeriodParams};
use serde::Serialize;

use crate::client::{QueryClient, QuerySnapshot};
use crate::query::{AlertsQuery, CurrentStatusQuery, MachineHealthQuery, SystemHealthQuery};
use crate::sync::{PollConfig, SubscriptionHandle};

/// Availability of one series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesStatus {
    /// Never requested.
    NotRequested,
    /// First request running, nothing to show yet.
    Loading,
    /// Every request so far failed.
    Failed,
    /// Fetched, but holds no records.
    Empty,
    /// Fetched and holds records.
    Ready,
}

/// Payloads that can be empty.
pub trait SeriesData {
    fn is_empty_series(&self) -> bool;
}

impl<T> SeriesData for Vec<T> {
    fn is_empty_series(&self) -> bool {
        self.is_empty()
    }
}

impl SeriesData for CurrentOperationStatus {
    fn is_empty_series(&self) -> bool {
        self.stations.is_empty()
    }
}

/// One series of the view.
///
/// A series that has a value keeps it while a refresh fails; the error is
/// reported next to the data.
#[derive(Debug)]
pub struct Series<T> {
    pub status: SeriesStatus,
    pub data: Option<Arc<T>>,
    pub error: Option<DashboardError>,
    pub is_stale: bool,
}

impl<T> Clone for Series<T> {
    fn clone(&self) -> Self {
        Self {
            status: self.status,
            data: self.data.clone(),
            error: self.error.clone(),
            is_stale: self.is_stale,
        }
    }
}

impl<T: SeriesData> Series<T> {
    pub fn not_requested() -> Self {
        Self {
            status: SeriesStatus::NotRequested,
            data: None,
            error: None,
            is_stale: false,
        }
    }

    /// Classifies a cache snapshot; `None` means the query was never
    /// requested.
    pub fn from_snapshot(snapshot: Option<QuerySnapshot<T>>) -> Self {
        let Some(snapshot) = snapshot else {
            return Self::not_requested();
        };

        let status = match &snapshot.value {
            Some(value) if value.is_empty_series() => SeriesStatus::Empty,
            Some(_) => SeriesStatus::Ready,
            None if snapshot.is_loading => SeriesStatus::Loading,
            None if snapshot.error.is_some() => SeriesStatus::Failed,
            None => SeriesStatus::NotRequested,
        };

        Self {
            status,
            data: snapshot.value,
            error: snapshot.error,
            is_stale: snapshot.is_stale,
        }
    }

    /// True once a response arrived, including a confirmed empty one.
    pub fn has_real_data(&self) -> bool {
        matches!(self.status, SeriesStatus::Empty | SeriesStatus::Ready)
    }

    /// Records of the series, or `None` when nothing was fetched yet.
    pub fn data(&self) -> Option<&T> {
        self.data.as_deref()
    }
}

/// Which series received a response. Use the series status to tell an
/// empty response from records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HasRealData {
    pub system_health: bool,
    pub machine_health: bool,
    pub alerts: bool,
    pub operation_status: bool,
}

/// The queries behind one monitoring view.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoringQueries {
    pub system_health: SystemHealthQuery,
    pub machine_health: MachineHealthQuery,
    pub alerts: AlertsQuery,
    pub current_status: CurrentStatusQuery,
}

impl MonitoringQueries {
    /// Queries for `window`, restricted to `stations` when not empty.
    pub fn new(window: PeriodParams, stations: &[String]) -> Self {
        let (window, status) = if stations.is_empty() {
            (window, CurrentStatusParams::default())
        } else {
            (
                window.with_stations(stations.iter().cloned()),
                CurrentStatusParams::stations(stations.iter().cloned()),
            )
        };

        Self {
            system_health: SystemHealthQuery::new(window.clone()),
            machine_health: MachineHealthQuery::new(window.clone()),
            alerts: AlertsQuery::new(window),
            current_status: CurrentStatusQuery::new(status),
        }
    }

    /// Today's telemetry of every station.
    pub fn live() -> Self {
        Self::new(PeriodParams::today(), &[])
    }

    /// Polls the four series.
    ///
    /// The health series follow `config.interval`; alerts and the
    /// operation state are polled at their own freshness windows.
    pub fn subscribe(
        &self,
        client: &QueryClient,
        config: PollConfig,
        enabled: bool,
    ) -> Vec<SubscriptionHandle> {
        let stale = client.stale_times();
        let alerts = PollConfig {
            interval: stale.alerts,
            ..config
        };
        let status = PollConfig {
            interval: stale.current_status,
            ..config
        };

        vec![
            client.subscribe(self.system_health.clone(), config, enabled),
            client.subscribe(self.machine_health.clone(), config, enabled),
            client.subscribe(self.alerts.clone(), alerts, enabled),
            client.subscribe(self.current_status.clone(), status, enabled),
        ]
    }
}

/// Latest readings of one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReading {
    pub station_id: String,
    pub system: Option<SystemHealthRecord>,
    pub machine: Option<MachineHealthRecord>,
    /// `None` when the station is missing from the operation state.
    pub running: Option<bool>,
}

impl StationReading {
    fn new(station_id: &str) -> Self {
        Self {
            station_id: station_id.to_string(),
            system: None,
            machine: None,
            running: None,
        }
    }
}

/// Alert totals by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
    pub other: usize,
    pub total: usize,
}

impl AlertCounts {
    pub fn from_alerts(alerts: &[AlertRecord]) -> Self {
        alerts.iter().fold(Self::default(), |mut counts, alert| {
            match alert.severity {
                Severity::Info => counts.info += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Critical => counts.critical += 1,
                Severity::Other => counts.other += 1,
            }
            counts.total += 1;
            counts
        })
    }
}

/// Snapshot of everything the monitoring screen shows.
#[derive(Debug, Clone)]
pub struct MonitoringView {
    pub system_health: Series<Vec<SystemHealthRecord>>,
    pub machine_health: Series<Vec<MachineHealthRecord>>,
    pub alerts: Series<Vec<AlertRecord>>,
    pub operation_status: Series<CurrentOperationStatus>,
    pub has_real_data: HasRealData,
    /// Latest readings per station, ordered by station id.
    pub stations: Vec<StationReading>,
    pub alert_counts: AlertCounts,
}

impl MonitoringView {
    /// Builds the view from the current cache state, without requesting
    /// anything.
    pub fn compute(client: &QueryClient, queries: &MonitoringQueries) -> Self {
        Self::from_series(
            Series::from_snapshot(client.peek(&queries.system_health)),
            Series::from_snapshot(client.peek(&queries.machine_health)),
            Series::from_snapshot(client.peek(&queries.alerts)),
            Series::from_snapshot(client.peek(&queries.current_status)),
        )
    }

    pub fn from_series(
        system_health: Series<Vec<SystemHealthRecord>>,
        machine_health: Series<Vec<MachineHealthRecord>>,
        alerts: Series<Vec<AlertRecord>>,
        operation_status: Series<CurrentOperationStatus>,
    ) -> Self {
        let has_real_data = HasRealData {
            system_health: system_health.has_real_data(),
            machine_health: machine_health.has_real_data(),
            alerts: alerts.has_real_data(),
            operation_status: operation_status.has_real_data(),
        };

        let mut readings: BTreeMap<String, StationReading> = BTreeMap::new();

        let latest_system =
            latest_per_station(system_health.data(), |r| r.station_id(), |r| &r.timestamp);
        for record in latest_system {
            readings
                .entry(record.station_id().to_string())
                .or_insert_with(|| StationReading::new(record.station_id()))
                .system = Some(record.clone());
        }

        let latest_machine = latest_per_station(
            machine_health.data(),
            |r| r.station_id.as_str(),
            |r| &r.timestamp,
        );
        for record in latest_machine {
            readings
                .entry(record.station_id.clone())
                .or_insert_with(|| StationReading::new(&record.station_id))
                .machine = Some(record.clone());
        }

        if let Some(status) = operation_status.data() {
            for (station_id, station) in &status.stations {
                readings
                    .entry(station_id.clone())
                    .or_insert_with(|| StationReading::new(station_id))
                    .running = Some(station.current_state);
            }
        }

        let alert_counts = alerts
            .data()
            .map(|records| AlertCounts::from_alerts(records))
            .unwrap_or_default();

        Self {
            system_health,
            machine_health,
            alerts,
            operation_status,
            has_real_data,
            stations: readings.into_values().collect(),
            alert_counts,
        }
    }

    /// Running stations, once the operation state is known.
    pub fn running_stations(&self) -> Option<usize> {
        self.operation_status
            .data()
            .map(CurrentOperationStatus::running_count)
    }

    /// Reported stations, once the operation state is known.
    pub fn total_stations(&self) -> Option<usize> {
        self.operation_status
            .data()
            .map(CurrentOperationStatus::total_count)
    }

    /// True while any series waits for its first value.
    pub fn is_loading(&self) -> bool {
        [
            self.system_health.status,
            self.machine_health.status,
            self.alerts.status,
            self.operation_status.status,
        ]
        .contains(&SeriesStatus::Loading)
    }
}

fn latest_per_station<'a, T, S, D>(
    records: Option<&'a Vec<T>>,
    station: S,
    timestamp: D,
) -> Vec<&'a T>
where
    S: Fn(&'a T) -> &'a str,
    D: Fn(&'a T) -> &'a MongoDate,
{
    let mut latest: BTreeMap<&str, &T> = BTreeMap::new();
    for record in records.into_iter().flatten() {
        latest
            .entry(station(record))
            .and_modify(|current| {
                if timestamp(record).sort_key() > timestamp(*current).sort_key() {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    latest.into_values().collect()
}
