//! # Pulse Sync
//!
//! Client-side data synchronization for the Station Pulse dashboard.
//!
//! ## Features
//!
//! - Canonical cache keys: equal parameters always map to the same slot
//! - At most one request in flight per key; concurrent readers share it
//! - Per-query freshness windows matching the server's own cache TTLs
//! - Polling subscriptions with RAII cancellation and failure backoff
//! - Invalidation by key, by prefix or by glob pattern
//! - An aggregated monitoring view that tolerates missing series
//!
//! ## Example
//!
//! ```ignore
//! use pulse_sync::{CacheConfig, MonitoringQueries, MonitoringView, PollConfig, QueryClient};
//!
//! let client = QueryClient::new(transport, CacheConfig::default());
//! let queries = MonitoringQueries::live();
//! let _subscriptions = queries.subscribe(&client, PollConfig::default(), true);
//!
//! let mut changes = client.cache().subscribe_changes();
//! while changes.changed().await.is_ok() {
//!     let view = MonitoringView::compute(&client, &queries);
//!     render(&view);
//! }
//! ```

pub mod cache;
pub mod catalog;
pub mod client;
pub mod metrics;
pub mod mutations;
pub mod query;
pub mod sync;
pub mod view;

// Re-exports
pub use cache::{CacheConfig, CacheKey, InvalidationResult, QueryCache};
pub use catalog::{StationCatalog, refresh_station_catalog};
pub use client::{QueryClient, QuerySnapshot};
pub use metrics::{CacheMetrics, register_cache_metrics};
pub use query::{Query, StaleTimes};
pub use sync::{PollConfig, SubscriptionHandle, SubscriptionState};
pub use view::{
    AlertCounts, HasRealData, MonitoringQueries, MonitoringView, Series, SeriesStatus,
    StationReading,
};

// Re-export pulse_core for consumers
pub use pulse_core;
