//! Query client: cached reads and awaited fetches over one shared cache.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::{ApiTransport, DashboardError};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{
    CacheConfig, CacheKey, CachedValue, Demand, DemandKind, EntrySnapshot, FetchTicket,
    InvalidationResult, QueryCache, QueryEntry,
};
use crate::query::{Query, StaleTimes};

/// Typed view of a cache entry.
#[derive(Debug)]
pub struct QuerySnapshot<T> {
    /// Last successfully fetched value, kept across failures.
    pub value: Option<Arc<T>>,
    /// When the request that produced `value` was issued.
    pub fetched_at: Option<Instant>,
    pub is_stale: bool,
    pub is_loading: bool,
    /// Error of the last request, cleared by the next success.
    pub error: Option<DashboardError>,
}

impl<T> QuerySnapshot<T> {
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Clone for QuerySnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            fetched_at: self.fetched_at,
            is_stale: self.is_stale,
            is_loading: self.is_loading,
            error: self.error.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> QuerySnapshot<T> {
    fn from_entry(key: &CacheKey, snapshot: EntrySnapshot) -> Self {
        let (value, error) = match snapshot.value.map(|v| downcast::<T>(key, v)) {
            Some(Ok(value)) => (Some(value), snapshot.error),
            Some(Err(mismatch)) => (None, Some(mismatch)),
            None => (None, snapshot.error),
        };
        Self {
            value,
            fetched_at: snapshot.fetched_at,
            is_stale: snapshot.is_stale,
            is_loading: snapshot.is_loading,
            error,
        }
    }
}

fn downcast<T: Send + Sync + 'static>(
    key: &CacheKey,
    value: CachedValue,
) -> Result<Arc<T>, DashboardError> {
    value.downcast::<T>().map_err(|_| {
        DashboardError::unknown(format!("cached value of {} has an unexpected type", key))
    })
}

/// Entry point for cached queries.
///
/// Owns the [`QueryCache`], the transport and the freshness windows.
/// Cloning is cheap and every clone shares the same cache, so one client
/// is created at startup and handed to each consumer.
///
/// Requests run as detached Tokio tasks: a caller that stops waiting
/// never cancels a request other callers are sharing. Reads must
/// therefore happen inside a Tokio runtime.
#[derive(Clone)]
pub struct QueryClient {
    cache: QueryCache,
    transport: Arc<dyn ApiTransport>,
    stale: Arc<StaleTimes>,
}

impl QueryClient {
    /// Creates a client with default freshness windows.
    pub fn new(transport: Arc<dyn ApiTransport>, config: CacheConfig) -> Self {
        Self {
            cache: QueryCache::new(config),
            transport,
            stale: Arc::new(StaleTimes::default()),
        }
    }

    /// Replaces the freshness windows.
    pub fn with_stale_times(mut self, stale: StaleTimes) -> Self {
        self.stale = Arc::new(stale);
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn stale_times(&self) -> &StaleTimes {
        &self.stale
    }

    pub fn transport(&self) -> &dyn ApiTransport {
        self.transport.as_ref()
    }

    /// Returns the current state of `query` and starts a request if the
    /// cached value is missing or stale and none is running.
    ///
    /// Never waits: a stale value is returned with `is_loading = true`
    /// while it is being refreshed.
    pub fn read<Q: Query>(&self, query: &Q) -> QuerySnapshot<Q::Output> {
        let key = query.key();
        let entry = self.cache.entry(&key);
        let demand = self.demand(&entry, query);
        QuerySnapshot::from_entry(&key, demand.snapshot)
    }

    /// Returns the value of `query`, waiting for a request when the cached
    /// value is missing or stale.
    ///
    /// A running request is shared, never duplicated.
    ///
    /// # Errors
    ///
    /// Returns the error of the request that was awaited. The entry keeps
    /// its previous value in that case.
    pub async fn fetch<Q: Query>(&self, query: &Q) -> Result<Arc<Q::Output>, DashboardError> {
        let key = query.key();
        let entry = self.cache.entry(&key);
        let demand = self.demand(&entry, query);

        let Some(mut pending) = demand.pending else {
            return match demand.snapshot.value {
                Some(value) => downcast(&key, value),
                None => Err(DashboardError::unknown(format!("{} has no value", key))),
            };
        };

        let finished = pending.wait_for(|done| *done).await.is_ok();
        if !finished {
            return Err(DashboardError::unknown(format!(
                "request for {} was aborted",
                key
            )));
        }

        let snapshot = entry.snapshot(self.stale_after(query), Instant::now());
        match (snapshot.error, snapshot.value) {
            (Some(error), _) => Err(error),
            (None, Some(value)) => downcast(&key, value),
            (None, None) => Err(DashboardError::unknown(format!("{} has no value", key))),
        }
    }

    /// Returns the current state of `query` without starting a request.
    ///
    /// `None` means the query was never requested.
    pub fn peek<Q: Query>(&self, query: &Q) -> Option<QuerySnapshot<Q::Output>> {
        let key = query.key();
        let entry = self.cache.get(&key)?;
        let snapshot = entry.snapshot(self.stale_after(query), Instant::now());
        Some(QuerySnapshot::from_entry(&key, snapshot))
    }

    /// Starts a request for `query` if its value is missing or stale.
    pub fn prefetch<Q: Query>(&self, query: &Q) {
        let entry = self.cache.entry(&query.key());
        self.demand(&entry, query);
    }

    /// Marks the cache slot of `query` stale.
    pub fn invalidate_query<Q: Query>(&self, query: &Q) -> InvalidationResult {
        self.cache.invalidate(&query.key())
    }

    fn stale_after<Q: Query>(&self, query: &Q) -> Duration {
        query.stale_after(&self.stale)
    }

    fn demand<Q: Query>(&self, entry: &Arc<QueryEntry>, query: &Q) -> Demand {
        let demand = entry.demand(self.stale_after(query), Instant::now(), |ticket| {
            self.cache.pin_in_flight(entry);
            self.spawn_fetch(Arc::clone(entry), query.clone(), ticket)
        });

        let metrics = self.cache.metrics();
        match demand.kind {
            DemandKind::Fresh => {
                metrics.record_hit();
                debug!(key = %entry.key(), "Cache hit");
            },
            DemandKind::Joined => {
                metrics.record_miss();
                metrics.record_coalesced();
                debug!(key = %entry.key(), "Joined request in flight");
            },
            DemandKind::Started => {
                metrics.record_miss();
                self.cache.notify_changed();
                debug!(key = %entry.key(), "Cache miss, fetching");
            },
        }

        demand
    }

    fn spawn_fetch<Q: Query>(&self, entry: Arc<QueryEntry>, query: Q, ticket: FetchTicket) {
        let client = self.clone();
        tokio::spawn(async move {
            let result = query.fetch(client.transport.as_ref()).await;
            let elapsed = ticket.issued_at().elapsed();
            let key = entry.key();

            let outcome = match &result {
                Ok(_) => {
                    debug!(key = %key, elapsed = ?elapsed, "Query fetched");
                    "success"
                },
                Err(e) => {
                    warn!(key = %key, kind = %e.kind(), error = %e, "Query fetch failed");
                    e.kind().as_str()
                },
            };
            client
                .cache
                .metrics()
                .record_fetch(key.domain(), key.operation(), outcome, elapsed);

            entry.complete(ticket, result.map(|value| Arc::new(value) as CachedValue));
            client.cache.release_in_flight(&entry);
            client.cache.notify_changed();
        });
    }
}
