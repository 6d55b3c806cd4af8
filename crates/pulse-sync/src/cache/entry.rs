//! Per-key cache state and the single in-flight request guard.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pulse_core::DashboardError;
use tokio::sync::watch;
use tokio::time::Instant;

use super::CacheKey;

/// Type-erased cached value.
pub type CachedValue = Arc<dyn Any + Send + Sync>;

/// Point-in-time view of one entry.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    pub value: Option<CachedValue>,
    /// When the request that produced `value` was issued.
    pub fetched_at: Option<Instant>,
    pub is_stale: bool,
    pub is_loading: bool,
    pub error: Option<DashboardError>,
}

/// How a demand on an entry was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandKind {
    /// The cached value is fresh; nothing was requested.
    Fresh,
    /// A request was already running; the caller shares it.
    Joined,
    /// A new request was started.
    Started,
}

/// Result of [`QueryEntry::demand`].
#[derive(Debug)]
pub struct Demand {
    pub kind: DemandKind,
    pub snapshot: EntrySnapshot,
    /// Completion signal of the running request, unless the value was fresh.
    pub pending: Option<watch::Receiver<bool>>,
}

/// Permission to run the one request of an entry. Handed back through
/// [`QueryEntry::complete`].
#[derive(Debug)]
pub struct FetchTicket {
    epoch: u64,
    issued_at: Instant,
    done: watch::Sender<bool>,
}

impl FetchTicket {
    /// When the request was issued.
    pub fn issued_at(&self) -> Instant {
        self.issued_at
    }
}

#[derive(Debug, Default)]
struct EntryState {
    value: Option<CachedValue>,
    fetched_at: Option<Instant>,
    last_error: Option<DashboardError>,
    invalidated: bool,
    /// Bumped on every invalidation.
    epoch: u64,
    in_flight: Option<watch::Receiver<bool>>,
}

impl EntryState {
    fn is_stale(&self, stale_after: Duration, now: Instant) -> bool {
        match self.fetched_at {
            Some(at) if !self.invalidated => now.saturating_duration_since(at) >= stale_after,
            _ => true,
        }
    }

    /// Returns the running request, dropping a guard whose task died.
    fn running(&mut self) -> Option<watch::Receiver<bool>> {
        let alive = self
            .in_flight
            .as_ref()
            .is_some_and(|rx| rx.has_changed().is_ok());
        if !alive {
            self.in_flight = None;
        }
        self.in_flight.clone()
    }

    fn snapshot(&self, stale_after: Duration, now: Instant) -> EntrySnapshot {
        EntrySnapshot {
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            is_stale: self.is_stale(stale_after, now),
            is_loading: self.in_flight.is_some(),
            error: self.last_error.clone(),
        }
    }
}

/// State of one cache key.
///
/// The state sits behind a mutex that is never held across an `.await`.
#[derive(Debug)]
pub struct QueryEntry {
    key: CacheKey,
    state: Mutex<EntryState>,
}

impl QueryEntry {
    pub fn new(key: CacheKey) -> Self {
        Self {
            key,
            state: Mutex::new(EntryState::default()),
        }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Serves a demand for this entry's value.
    ///
    /// A fresh value is returned as is. A stale or missing value joins the
    /// running request if there is one; otherwise the entry is marked in
    /// flight and `start` is called with the ticket, all under the entry
    /// lock, so at most one request per key ever runs.
    pub fn demand<F>(&self, stale_after: Duration, now: Instant, start: F) -> Demand
    where
        F: FnOnce(FetchTicket),
    {
        let mut state = self.state.lock();

        if !state.is_stale(stale_after, now) {
            state.running();
            return Demand {
                kind: DemandKind::Fresh,
                snapshot: state.snapshot(stale_after, now),
                pending: None,
            };
        }

        if let Some(rx) = state.running() {
            return Demand {
                kind: DemandKind::Joined,
                snapshot: state.snapshot(stale_after, now),
                pending: Some(rx),
            };
        }

        let (done, rx) = watch::channel(false);
        state.in_flight = Some(rx.clone());
        start(FetchTicket {
            epoch: state.epoch,
            issued_at: now,
            done,
        });

        Demand {
            kind: DemandKind::Started,
            snapshot: state.snapshot(stale_after, now),
            pending: Some(rx),
        }
    }

    /// Stores the outcome of the request identified by `ticket` and wakes
    /// every waiter.
    ///
    /// A failure keeps the previous value. A success that raced with an
    /// invalidation is stored but leaves the entry stale.
    pub fn complete(&self, ticket: FetchTicket, result: Result<CachedValue, DashboardError>) {
        {
            let mut state = self.state.lock();
            match result {
                Ok(value) => {
                    state.value = Some(value);
                    state.fetched_at = Some(ticket.issued_at);
                    state.last_error = None;
                    if state.epoch == ticket.epoch {
                        state.invalidated = false;
                    }
                },
                Err(error) => {
                    state.last_error = Some(error);
                },
            }
            state.in_flight = None;
        }
        let _ = ticket.done.send(true);
    }

    /// Marks the entry stale regardless of its age.
    pub fn invalidate(&self) {
        let mut state = self.state.lock();
        state.invalidated = true;
        state.epoch += 1;
    }

    /// Returns the current state without side effects on freshness.
    pub fn snapshot(&self, stale_after: Duration, now: Instant) -> EntrySnapshot {
        let mut state = self.state.lock();
        state.running();
        state.snapshot(stale_after, now)
    }

    /// Returns true while a request for this entry is running.
    pub fn is_fetching(&self) -> bool {
        self.state.lock().running().is_some()
    }
}
