//! Query cache for Station Pulse.
//!
//! This module provides the client-side cache layer using Moka: canonical
//! cache keys, per-key entries that allow at most one request in flight,
//! and the invalidation bus.

pub mod entry;
pub mod invalidation;
pub mod keys;
pub mod store;

// Re-exports
pub use entry::{CachedValue, Demand, DemandKind, EntrySnapshot, FetchTicket, QueryEntry};
pub use invalidation::InvalidationResult;
pub use keys::CacheKey;
pub use store::{CacheConfig, QueryCache};
