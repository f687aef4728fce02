//! Single-slot persistent result cache.
//!
//! Exactly one analysis result is persisted at a time, replaced wholesale
//! on every successful orchestrator run. Storage problems never propagate:
//! a cache that cannot read or write degrades to "no cache" with a log
//! line, and the rest of the system carries on.

use crate::storage::KeyValueStore;
use crate::types::{AnalysisResult, CacheEntry, DataOrigin};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Store key for the single cached entry.
const CACHE_KEY: &str = "commit_metrics.last_repo";

/// Persistent cache holding the most recent analysis result.
pub struct ResultCache {
    store: Arc<dyn KeyValueStore>,
    clock: fn() -> DateTime<Utc>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock (tests).
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist `result` as the new single entry, stamped with the current
    /// time. Serialization or storage failures are logged and swallowed.
    pub fn write(&self, repository_id: &str, result: &AnalysisResult, origin: DataOrigin) {
        let entry = CacheEntry {
            repository_id: repository_id.to_string(),
            result: result.clone(),
            origin,
            fetched_at: (self.clock)(),
        };
        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("could not serialize cache entry for {repository_id}: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(CACHE_KEY, &raw) {
            log::warn!("could not persist cache entry for {repository_id}: {err}");
        }
    }

    /// The stored entry, whatever repository it belongs to. Callers compare
    /// `entry.repository_id` against the id they want before trusting it.
    pub fn read(&self) -> Option<CacheEntry> {
        let raw = match self.store.get(CACHE_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                log::warn!("cache read failed: {err}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("discarding undecodable cache entry: {err}");
                None
            }
        }
    }

    /// Drop the stored entry.
    pub fn invalidate(&self) {
        if let Err(err) = self.store.remove(CACHE_KEY) {
            log::warn!("cache invalidation failed: {err}");
        }
    }

    /// Whether the stored entry is younger than `max_age`. An entry exactly
    /// `max_age` old is still valid; an absent entry never is.
    pub fn is_valid(&self, max_age: Duration) -> bool {
        self.is_valid_at(max_age, (self.clock)())
    }

    /// Validity against an explicit "now" (clock injection).
    pub fn is_valid_at(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.read() else {
            return false;
        };
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        now - entry.fetched_at <= max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::types::Commit;
    use std::collections::HashMap;

    fn sample_result(id: &str) -> AnalysisResult {
        let commit = Commit {
            hash: "abcdef0".into(),
            author: "alice".into(),
            date: Utc::now(),
            message: "initial".into(),
        };
        AnalysisResult::from_parts(
            id,
            vec![commit],
            vec![],
            HashMap::from([("Rust".to_string(), 10)]),
        )
    }

    fn cache() -> ResultCache {
        ResultCache::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn round_trip_preserves_result_and_timestamps_recently() {
        let cache = cache();
        let result = sample_result("https://github.com/acme/widgets");
        let before = Utc::now();
        cache.write("https://github.com/acme/widgets", &result, DataOrigin::Primary);

        let entry = cache.read().expect("entry present");
        assert_eq!(entry.repository_id, "https://github.com/acme/widgets");
        assert_eq!(entry.result, result);
        assert_eq!(entry.origin, DataOrigin::Primary);
        assert!(entry.fetched_at >= before && entry.fetched_at <= Utc::now());
    }

    #[test]
    fn invalidate_makes_the_cache_invalid() {
        let cache = cache();
        cache.write("id", &sample_result("id"), DataOrigin::Fallback);
        assert!(cache.is_valid(Duration::from_secs(60)));

        cache.invalidate();
        assert!(!cache.is_valid(Duration::from_secs(60)));
        assert!(cache.read().is_none());
    }

    #[test]
    fn validity_boundary_treats_exact_age_as_valid() {
        let cache = cache();
        cache.write("id", &sample_result("id"), DataOrigin::Primary);
        let entry = cache.read().unwrap();
        let max_age = Duration::from_secs(3600);

        // Exactly max_age old: still valid.
        let at_boundary = entry.fetched_at + chrono::Duration::seconds(3600);
        assert!(cache.is_valid_at(max_age, at_boundary));

        // One second past: expired.
        let past_boundary = at_boundary + chrono::Duration::seconds(1);
        assert!(!cache.is_valid_at(max_age, past_boundary));
    }

    #[test]
    fn absent_entry_is_never_valid() {
        assert!(!cache().is_valid(Duration::from_secs(3600)));
    }

    #[test]
    fn undecodable_slot_degrades_to_no_cache() {
        let store = Arc::new(MemoryStore::new());
        store.set(CACHE_KEY, "not json").unwrap();
        let cache = ResultCache::new(store);
        assert!(cache.read().is_none());
        assert!(!cache.is_valid(Duration::from_secs(60)));
    }

    #[test]
    fn failing_store_is_swallowed() {
        struct BrokenStore;
        impl KeyValueStore for BrokenStore {
            fn get(&self, _key: &str) -> Result<Option<String>, crate::AnalyticsError> {
                Err(crate::AnalyticsError::Storage("quota exceeded".into()))
            }
            fn set(&self, _key: &str, _value: &str) -> Result<(), crate::AnalyticsError> {
                Err(crate::AnalyticsError::Storage("quota exceeded".into()))
            }
            fn remove(&self, _key: &str) -> Result<(), crate::AnalyticsError> {
                Err(crate::AnalyticsError::Storage("quota exceeded".into()))
            }
        }

        let cache = ResultCache::new(Arc::new(BrokenStore));
        // None of these may panic or propagate.
        cache.write("id", &sample_result("id"), DataOrigin::Primary);
        assert!(cache.read().is_none());
        assert!(!cache.is_valid(Duration::from_secs(60)));
        cache.invalidate();
    }
}
