//! Invalidation bus: mark entries stale by key, prefix or glob pattern.
//!
//! Invalidation never removes an entry. The last value stays readable and
//! the next read or poll of the key issues a new request regardless of the
//! entry's age.

use crate::cache::{CacheKey, QueryCache, QueryEntry};
use glob::Pattern;
use tracing::{debug, info};

/// Result of an invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidationResult {
    /// Number of entries marked stale.
    pub count: usize,
    /// Patterns that were applied, in `domain:operation[:params]` form.
    pub patterns: Vec<String>,
}

impl QueryCache {
    /// Marks every entry stale.
    pub fn invalidate_all(&self) -> InvalidationResult {
        let count = self.invalidate_where(|_| true);
        info!(count = count, "All cache entries invalidated");
        InvalidationResult {
            count,
            patterns: vec!["*".to_string()],
        }
    }

    /// Marks one entry stale.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulse_sync::cache::{CacheKey, QueryCache};
    ///
    /// let cache = QueryCache::default();
    /// let key = CacheKey::new("operation-stats", "health");
    ///
    /// assert_eq!(cache.invalidate(&key).count, 0);
    /// cache.entry(&key);
    /// assert_eq!(cache.invalidate(&key).count, 1);
    /// ```
    pub fn invalidate(&self, key: &CacheKey) -> InvalidationResult {
        let count = match self.get(key) {
            Some(entry) => {
                entry.invalidate();
                self.notify_changed();
                1
            },
            None => 0,
        };

        debug!(key = %key, count = count, "Cache entry invalidated");

        InvalidationResult {
            count,
            patterns: vec![key.to_string()],
        }
    }

    /// Marks every entry of a domain stale, or of one operation of it.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulse_sync::cache::{CacheKey, QueryCache};
    /// use serde_json::json;
    ///
    /// let cache = QueryCache::default();
    /// cache.entry(&CacheKey::new("stations", "sites"));
    /// cache.entry(&CacheKey::for_params("stations", "list", &json!({ "site": "A" })));
    /// cache.entry(&CacheKey::new("stats", "period"));
    ///
    /// assert_eq!(cache.invalidate_prefix("stations", None).count, 2);
    /// assert_eq!(cache.invalidate_prefix("stations", Some("list")).count, 1);
    /// ```
    pub fn invalidate_prefix(&self, domain: &str, operation: Option<&str>) -> InvalidationResult {
        let count = self.invalidate_where(|key| key.matches_prefix(domain, operation));
        let pattern = match operation {
            Some(op) => format!("{}:{}*", domain, op),
            None => format!("{}:*", domain),
        };

        info!(pattern = %pattern, count = count, "Cache entries invalidated by prefix");

        InvalidationResult {
            count,
            patterns: vec![pattern],
        }
    }

    /// Marks entries stale using a glob pattern over the key's display form
    /// (`domain:operation[:params]`).
    ///
    /// - `*`: matches any sequence of characters
    /// - `?`: matches one character
    ///
    /// An invalid pattern matches nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// use pulse_sync::cache::{CacheKey, QueryCache};
    ///
    /// let cache = QueryCache::default();
    /// cache.entry(&CacheKey::new("health-stats", "today-summary"));
    /// cache.entry(&CacheKey::new("stats", "today-summary"));
    /// cache.entry(&CacheKey::new("stats", "week-summary"));
    ///
    /// // Every today summary, whatever the domain
    /// assert_eq!(cache.invalidate_by_pattern("*:today-summary*").count, 2);
    /// ```
    pub fn invalidate_by_pattern(&self, pattern_str: &str) -> InvalidationResult {
        let pattern = match Pattern::new(pattern_str) {
            Ok(p) => p,
            Err(e) => {
                debug!(pattern = %pattern_str, error = %e, "Invalid glob pattern");
                return InvalidationResult {
                    count: 0,
                    patterns: vec![pattern_str.to_string()],
                };
            },
        };

        let count = self.invalidate_where(|key| pattern.matches(&key.to_string()));

        info!(
            pattern = %pattern_str,
            count = count,
            "Cache entries invalidated by pattern"
        );

        InvalidationResult {
            count,
            patterns: vec![pattern_str.to_string()],
        }
    }

    /// Applies several glob patterns; the counts are summed.
    pub fn invalidate_by_patterns(&self, patterns: &[&str]) -> InvalidationResult {
        let mut total_count = 0;
        let mut all_patterns = Vec::new();

        for pattern_str in patterns {
            let result = self.invalidate_by_pattern(pattern_str);
            total_count += result.count;
            all_patterns.extend(result.patterns);
        }

        InvalidationResult {
            count: total_count,
            patterns: all_patterns,
        }
    }

    fn invalidate_where<F>(&self, matches: F) -> usize
    where
        F: Fn(&CacheKey) -> bool,
    {
        let matched: Vec<std::sync::Arc<QueryEntry>> = self
            .iter()
            .filter(|(key, _)| matches(key))
            .map(|(_, entry)| entry)
            .collect();

        for entry in &matched {
            entry.invalidate();
        }
        if !matched.is_empty() {
            self.notify_changed();
        }
        matched.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tokio::time::Instant;

    const STALE: Duration = Duration::from_secs(60);

    /// Inserts a key and stores a fresh value for it.
    fn populate(cache: &QueryCache, key: &CacheKey) {
        let entry = cache.entry(key);
        let mut ticket = None;
        entry.demand(STALE, Instant::now(), |t| ticket = Some(t));
        if let Some(ticket) = ticket {
            entry.complete(ticket, Ok(std::sync::Arc::new(())));
        }
    }

    fn is_stale(cache: &QueryCache, key: &CacheKey) -> bool {
        cache
            .get(key)
            .map(|e| e.snapshot(STALE, Instant::now()).is_stale)
            .unwrap_or(true)
    }

    fn seeded() -> (QueryCache, Vec<CacheKey>) {
        let cache = QueryCache::default();
        let keys = vec![
            CacheKey::new("stations", "sites"),
            CacheKey::for_params("stations", "list", &json!({ "site": "Hwaseong" })),
            CacheKey::new("operation-stats", "health"),
            CacheKey::for_params("operation-stats", "current-status", &json!({ "station_ids": ["JSW"] })),
            CacheKey::for_params("stats", "today-summary", &json!({})),
        ];
        for key in &keys {
            populate(&cache, key);
            assert!(!is_stale(&cache, key));
        }
        (cache, keys)
    }

    #[tokio::test]
    async fn test_invalidate_all() {
        let (cache, keys) = seeded();

        let result = cache.invalidate_all();

        assert_eq!(result.count, keys.len());
        assert!(keys.iter().all(|k| is_stale(&cache, k)));
        // Values survive invalidation
        assert!(keys.iter().all(|k| cache.contains(k)));
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let (cache, keys) = seeded();

        let result = cache.invalidate_prefix("operation-stats", None);

        assert_eq!(result.count, 2);
        assert_eq!(result.patterns, vec!["operation-stats:*"]);
        assert!(is_stale(&cache, &keys[2]));
        assert!(is_stale(&cache, &keys[3]));
        assert!(!is_stale(&cache, &keys[0]));
        assert!(!is_stale(&cache, &keys[4]));
    }

    #[tokio::test]
    async fn test_invalidate_single_key_is_idempotent() {
        let (cache, keys) = seeded();

        assert_eq!(cache.invalidate(&keys[1]).count, 1);
        assert_eq!(cache.invalidate(&keys[1]).count, 1);
        assert!(is_stale(&cache, &keys[1]));
        assert!(!is_stale(&cache, &keys[0]));
    }

    #[tokio::test]
    async fn test_invalidate_by_pattern() {
        let (cache, keys) = seeded();

        let result = cache.invalidate_by_pattern("stations:*");

        assert_eq!(result.count, 2);
        assert!(is_stale(&cache, &keys[0]));
        assert!(is_stale(&cache, &keys[1]));
        assert!(!is_stale(&cache, &keys[2]));
    }

    #[tokio::test]
    async fn test_invalidate_by_patterns() {
        let (cache, keys) = seeded();

        let result = cache.invalidate_by_patterns(&["stations:sites", "*:current-status:*"]);

        // stations:sites, operation-stats:current-status = 2 entries
        assert_eq!(result.count, 2);
        assert_eq!(result.patterns.len(), 2);
        assert!(is_stale(&cache, &keys[0]));
        assert!(is_stale(&cache, &keys[3]));
        assert!(!is_stale(&cache, &keys[1]));
    }

    #[tokio::test]
    async fn test_invalid_pattern_matches_nothing() {
        let (cache, keys) = seeded();

        let result = cache.invalidate_by_pattern("[unclosed");

        assert_eq!(result.count, 0);
        assert!(keys.iter().all(|k| !is_stale(&cache, k)));
    }

    #[tokio::test]
    async fn test_invalidation_bumps_change_counter() {
        let (cache, _) = seeded();
        let before = cache.version();

        cache.invalidate_prefix("stats", None);
        assert!(cache.version() > before);

        let unchanged = cache.version();
        cache.invalidate_prefix("no-such-domain", None);
        assert_eq!(cache.version(), unchanged);
    }
}
