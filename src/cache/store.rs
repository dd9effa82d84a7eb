//! Fixed-capacity FIFO store for APOD records
//!
//! A minimal bounded map exposing only `get`, `put_if_absent` and
//! `contains`. When the store is full, inserting a new key evicts the
//! oldest-inserted entry. Entries are write-once: `put_if_absent` never
//! replaces an existing value, so concurrent misses for the same date leave
//! exactly one record behind (first writer wins).

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use tracing::debug;

use crate::data::Apod;

/// Default number of records held, matching the upstream proxy's heap pool
const DEFAULT_CAPACITY: usize = 10;

#[derive(Debug)]
struct Store {
    entries: HashMap<String, Apod>,
    /// Keys in insertion order; front is the eviction candidate
    order: VecDeque<String>,
}

/// Bounded key/value store mapping date strings to APOD records
///
/// Interior mutability lets one shared handle serve concurrent tasks; all
/// three operations take `&self`.
#[derive(Debug)]
pub struct ApodCache {
    capacity: usize,
    store: Mutex<Store>,
}

impl Default for ApodCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ApodCache {
    /// Creates a cache with the default capacity of 10 entries
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a cache holding at most `capacity` entries
    ///
    /// `capacity` must be at least 1.
    pub fn with_capacity(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "cache capacity must be at least 1");
        Self {
            capacity,
            store: Mutex::new(Store {
                entries: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    /// Returns a copy of the record stored under `key`, if any
    pub fn get(&self, key: &str) -> Option<Apod> {
        let store = self.store.lock().expect("cache lock poisoned");
        store.entries.get(key).cloned()
    }

    /// Returns whether a record is stored under `key`
    #[allow(dead_code)]
    pub fn contains(&self, key: &str) -> bool {
        let store = self.store.lock().expect("cache lock poisoned");
        store.entries.contains_key(key)
    }

    /// Inserts `value` under `key` unless the key is already present
    ///
    /// Returns whether the insert happened. An existing entry is never
    /// replaced; the losing writer's value is simply not retained. The empty
    /// sentinel is rejected so the cache can never serve a failure record.
    /// Inserting into a full cache first evicts the oldest-inserted entry.
    pub fn put_if_absent(&self, key: &str, value: Apod) -> bool {
        if value.is_empty() {
            return false;
        }

        let mut store = self.store.lock().expect("cache lock poisoned");
        if store.entries.contains_key(key) {
            return false;
        }

        while store.entries.len() >= self.capacity {
            match store.order.pop_front() {
                Some(oldest) => {
                    store.entries.remove(&oldest);
                    debug!(key = %oldest, "evicted oldest cache entry");
                }
                None => break,
            }
        }

        store.entries.insert(key.to_string(), value);
        store.order.push_back(key.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sample_apod(date: &str) -> Apod {
        Apod {
            id: "0".to_string(),
            date: date.to_string(),
            title: format!("Picture for {date}"),
            explanation: String::new(),
            url: format!("https://apod.nasa.gov/{date}.jpg"),
            hdurl: None,
        }
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let cache = ApodCache::new();
        assert!(cache.get("2019-01-10").is_none());
        assert!(!cache.contains("2019-01-10"));
    }

    #[test]
    fn test_put_then_get_roundtrip() {
        let cache = ApodCache::new();
        let apod = sample_apod("2019-01-10");

        assert!(cache.put_if_absent("2019-01-10", apod.clone()));
        assert!(cache.contains("2019-01-10"));
        assert_eq!(cache.get("2019-01-10"), Some(apod));
    }

    #[test]
    fn test_put_if_absent_never_overwrites() {
        let cache = ApodCache::new();
        let first = sample_apod("2019-01-10");
        let mut second = sample_apod("2019-01-10");
        second.title = "Different title".to_string();

        assert!(cache.put_if_absent("2019-01-10", first.clone()));
        assert!(!cache.put_if_absent("2019-01-10", second));
        assert_eq!(cache.get("2019-01-10"), Some(first));
    }

    #[test]
    fn test_empty_sentinel_is_rejected() {
        let cache = ApodCache::new();

        assert!(!cache.put_if_absent("2019-01-10", Apod::empty()));
        assert!(!cache.contains("2019-01-10"));
    }

    #[test]
    fn test_eviction_removes_oldest_inserted_entry() {
        let cache = ApodCache::with_capacity(10);
        let dates: Vec<String> = (1..=11).map(|day| format!("2019-01-{day:02}")).collect();

        for date in dates.iter().take(10) {
            assert!(cache.put_if_absent(date, sample_apod(date)));
        }

        // The 11th insert evicts the first, and only the first
        assert!(cache.put_if_absent(&dates[10], sample_apod(&dates[10])));
        assert!(!cache.contains(&dates[0]));
        for date in dates.iter().skip(1) {
            assert!(cache.contains(date), "entry for {date} should survive");
        }
    }

    #[test]
    fn test_eviction_order_follows_insertion_order() {
        let cache = ApodCache::with_capacity(2);

        assert!(cache.put_if_absent("a", sample_apod("a")));
        assert!(cache.put_if_absent("b", sample_apod("b")));
        assert!(cache.put_if_absent("c", sample_apod("c")));
        assert!(!cache.contains("a"));

        assert!(cache.put_if_absent("d", sample_apod("d")));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_concurrent_put_if_absent_retains_exactly_one_value() {
        let cache = Arc::new(ApodCache::new());
        let mut handles = Vec::new();

        for writer in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                let mut apod = sample_apod("2019-01-10");
                apod.title = format!("writer {writer}");
                cache.put_if_absent("2019-01-10", apod)
            }));
        }

        let winners: Vec<bool> = handles
            .into_iter()
            .map(|handle| handle.join().expect("writer thread panicked"))
            .collect();

        assert_eq!(winners.iter().filter(|won| **won).count(), 1);
        assert!(cache.get("2019-01-10").is_some());
    }
}
