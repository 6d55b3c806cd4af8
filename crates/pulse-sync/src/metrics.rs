//! Cache and fetch metrics recording.

use metrics::{counter, gauge, histogram};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Registers the descriptions of the cache metrics.
/// Call once at startup, after the recorder is installed.
pub fn register_cache_metrics() {
    metrics::describe_counter!("pulse_cache_hits_total", "Reads served from a fresh entry");
    metrics::describe_counter!(
        "pulse_cache_misses_total",
        "Reads that found a missing or stale entry"
    );
    metrics::describe_counter!(
        "pulse_cache_evictions_total",
        "Entries removed from the query cache"
    );
    metrics::describe_gauge!("pulse_cache_entries", "Current number of cached queries");
    metrics::describe_counter!("pulse_fetch_total", "Completed API fetches by outcome");
    metrics::describe_counter!(
        "pulse_fetch_coalesced_total",
        "Reads that joined a request already in flight"
    );
    metrics::describe_histogram!("pulse_fetch_duration_seconds", "Time spent in API fetches");
}

/// Cache metrics recorder.
///
/// Keeps local hit/miss counters next to the global `metrics` ones so the
/// hit rate can be logged without a recorder installed.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    coalesced: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("pulse_cache_hits_total").increment(1);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("pulse_cache_misses_total").increment(1);
    }

    /// A read shared a request that was already running.
    pub fn record_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
        counter!("pulse_fetch_coalesced_total").increment(1);
    }

    pub fn record_eviction(&self, reason: &'static str) {
        counter!("pulse_cache_evictions_total", "reason" => reason).increment(1);
    }

    pub fn update_entry_count(&self, count: u64) {
        gauge!("pulse_cache_entries").set(count as f64);
    }

    /// Records a finished fetch. `outcome` is `success` or an error kind.
    pub fn record_fetch(
        &self,
        domain: &str,
        operation: &str,
        outcome: &'static str,
        duration: Duration,
    ) {
        counter!(
            "pulse_fetch_total",
            "domain" => domain.to_string(),
            "operation" => operation.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!(
            "pulse_fetch_duration_seconds",
            "domain" => domain.to_string(),
            "operation" => operation.to_string()
        )
        .record(duration.as_secs_f64());
    }

    /// Share of reads served from a fresh entry; 0 before the first read.
    pub fn hit_rate(&self) -> f64 {
        match self.hits() + self.misses() {
            0 => 0.0,
            reads => self.hits() as f64 / reads as f64,
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }
}
