use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug)]
struct CacheEntry<V> {
    value: Arc<V>,
    inserted_at: Instant,
}

#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.get_at(key, Instant::now())
    }

    pub fn get_or_try_insert_with<E, F>(&self, key: &K, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.get_or_try_insert_at(key, Instant::now(), build)
    }

    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<Arc<V>> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.inserted_at) < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn get_or_try_insert_at<E, F>(&self, key: &K, now: Instant, build: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get_at(key, now) {
            return Ok(value);
        }
        debug!(?key, "cache miss");
        let value = Arc::new(build()?);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.clone(),
                CacheEntry {
                    value: value.clone(),
                    inserted_at: now,
                },
            );
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn fresh_entries_are_served_from_cache() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let calls = Cell::new(0);
        let now = Instant::now();
        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_at(&"k", now, || {
                    calls.set(calls.get() + 1);
                    Ok::<_, ()>(7)
                })
                .unwrap();
            assert_eq!(*value, 7);
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn expired_entries_are_rebuilt() {
        let cache = TtlCache::new(Duration::from_secs(60));
        let start = Instant::now();
        cache
            .get_or_try_insert_at(&"k", start, || Ok::<_, ()>(1))
            .unwrap();
        let later = start + Duration::from_secs(61);
        assert!(cache.get_at(&"k", later).is_none());
        let value = cache
            .get_or_try_insert_at(&"k", later, || Ok::<_, ()>(2))
            .unwrap();
        assert_eq!(*value, 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let err = cache.get_or_try_insert_with(&"k", || Err("boom"));
        assert_eq!(err.unwrap_err(), "boom");
        assert!(cache.get(&"k").is_none());
        let value = cache.get_or_try_insert_with(&"k", || Ok::<_, &str>(3));
        assert_eq!(*value.unwrap(), 3);
    }

    #[test]
    fn invalidate_drops_everything() {
        let cache = TtlCache::new(Duration::from_secs(60));
        cache.get_or_try_insert_with(&1, || Ok::<_, ()>("a")).unwrap();
        cache.invalidate_all();
        assert!(cache.get(&1).is_none());
    }
}
