//! Query cache backed by Moka.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::{CacheKey, QueryEntry};
use crate::metrics::CacheMetrics;

/// Cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries (default: 1000).
    pub max_capacity: u64,
    /// Evict entries nobody read for this many seconds (optional).
    pub time_to_idle_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            time_to_idle_secs: None,
        }
    }
}

/// Bounded map from [`CacheKey`] to [`QueryEntry`].
///
/// Cloning is cheap; clones share the same entries. Every mutation of an
/// entry bumps a change counter that consumers can watch through
/// [`QueryCache::subscribe_changes`].
///
/// Eviction is least-recently-used, so a new key is always admitted. An
/// entry whose request is running stays reachable through its key even if
/// it is evicted meanwhile, and is put back once the request completes.
///
/// # Examples
///
/// ```
/// use pulse_sync::cache::{CacheConfig, CacheKey, QueryCache};
///
/// let cache = QueryCache::new(CacheConfig::default());
/// let key = CacheKey::new("stations", "sites");
///
/// assert!(cache.get(&key).is_none());
/// let entry = cache.entry(&key);
/// assert_eq!(entry.key(), &key);
/// assert!(cache.contains(&key));
/// ```
#[derive(Clone)]
pub struct QueryCache {
    inner: Cache<CacheKey, Arc<QueryEntry>>,
    /// Entries with a running request.
    in_flight: Arc<Mutex<HashMap<CacheKey, Arc<QueryEntry>>>>,
    metrics: CacheMetrics,
    changes: Arc<watch::Sender<u64>>,
}

impl QueryCache {
    /// Creates a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let metrics = CacheMetrics::new();

        let mut builder = Cache::builder()
            .max_capacity(config.max_capacity)
            .eviction_policy(EvictionPolicy::lru());

        if let Some(tti) = config.time_to_idle_secs {
            builder = builder.time_to_idle(Duration::from_secs(tti));
        }

        let eviction_metrics = metrics.clone();
        builder = builder.eviction_listener(move |_key, _value, cause| {
            let reason = match cause {
                RemovalCause::Expired => "idle",
                RemovalCause::Size => "capacity",
                RemovalCause::Explicit => "manual",
                RemovalCause::Replaced => "replaced",
            };
            eviction_metrics.record_eviction(reason);
        });

        let (changes, _) = watch::channel(0);

        Self {
            inner: builder.build(),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            metrics,
            changes: Arc::new(changes),
        }
    }

    /// Returns the entry for `key`, creating an empty one if needed.
    pub fn entry(&self, key: &CacheKey) -> Arc<QueryEntry> {
        let in_flight = self.in_flight.lock();
        if let Some(entry) = in_flight.get(key) {
            return Arc::clone(entry);
        }
        let entry = self
            .inner
            .get_with(key.clone(), || Arc::new(QueryEntry::new(key.clone())));
        drop(in_flight);
        self.metrics.update_entry_count(self.inner.entry_count());
        entry
    }

    /// Returns the entry for `key` if it exists.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<QueryEntry>> {
        if let Some(entry) = self.in_flight.lock().get(key) {
            return Some(Arc::clone(entry));
        }
        self.inner.get(key)
    }

    /// Returns true if an entry exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.in_flight.lock().contains_key(key) || self.inner.contains_key(key)
    }

    /// Keeps `entry` reachable while its request runs.
    pub(crate) fn pin_in_flight(&self, entry: &Arc<QueryEntry>) {
        self.in_flight
            .lock()
            .insert(entry.key().clone(), Arc::clone(entry));
    }

    /// Releases an entry pinned by [`pin_in_flight`](Self::pin_in_flight).
    ///
    /// An entry evicted while its request ran is stored again. One that was
    /// removed explicitly is no longer pinned and stays detached.
    pub(crate) fn release_in_flight(&self, entry: &Arc<QueryEntry>) {
        let mut in_flight = self.in_flight.lock();
        let pinned = in_flight
            .get(entry.key())
            .is_some_and(|pinned| Arc::ptr_eq(pinned, entry));
        if !pinned {
            return;
        }
        in_flight.remove(entry.key());
        if !self.inner.contains_key(entry.key()) {
            self.inner.insert(entry.key().clone(), Arc::clone(entry));
        }
    }

    /// Evicts one entry. A request still running for it completes into
    /// the detached entry and is not cached.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let pinned = self.in_flight.lock().remove(key).is_some();
        let removed = self.inner.remove(key).is_some() || pinned;
        if removed {
            self.notify_changed();
        }
        removed
    }

    /// Evicts every entry.
    pub fn clear(&self) {
        self.in_flight.lock().clear();
        self.inner.invalidate_all();
        self.inner.run_pending_tasks();
        self.metrics.update_entry_count(self.inner.entry_count());
        self.notify_changed();
    }

    /// Number of entries, after flushing pending maintenance.
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the entries, including in-flight ones that were
    /// evicted. Entries may change while iterating.
    pub fn iter(&self) -> impl Iterator<Item = (Arc<CacheKey>, Arc<QueryEntry>)> + '_ {
        let detached: Vec<_> = self
            .in_flight
            .lock()
            .iter()
            .filter(|(key, _)| !self.inner.contains_key(*key))
            .map(|(key, entry)| (Arc::new(key.clone()), Arc::clone(entry)))
            .collect();
        self.inner.iter().chain(detached)
    }

    /// Returns a receiver whose value changes whenever an entry changes.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Current value of the change counter.
    pub fn version(&self) -> u64 {
        *self.changes.borrow()
    }

    pub(crate) fn notify_changed(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
