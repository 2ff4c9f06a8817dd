use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, future::Future, hash::Hash, sync::Arc};
use tokio::sync::RwLock;

use crate::{clock::Clock, error::AppResult};

struct Entry<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// In-process cache whose entries expire `ttl` after insertion.
///
/// Time comes from the injected [`Clock`], so expiry is deterministic under a
/// `ManualClock` in tests. Expired entries are dropped lazily on lookup.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        self.clock.now() - entry.stored_at <= self.ttl
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if self.is_fresh(entry) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Another writer may have refreshed it in between
        if entries.get(key).is_some_and(|entry| !self.is_fresh(entry)) {
            entries.remove(key);
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let entry = Entry {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.write().await.insert(key, entry);
    }

    pub async fn invalidate(&self, key: &K) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Returns the fresh value for `key`, or runs `fetch` and stores its result.
    /// Errors are not cached.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: K, fetch: F) -> AppResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<V>>,
    {
        if let Some(value) = self.get(&key).await {
            return Ok(value);
        }
        let value = fetch().await?;
        self.insert(key, value.clone()).await;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, error::AppError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> (TtlCache<&'static str, u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (TtlCache::new(Duration::hours(1), clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let (cache, clock) = cache();
        cache.insert("shows", 1).await;

        clock.advance(Duration::minutes(59));
        assert_eq!(cache.get(&"shows").await, Some(1));

        clock.advance(Duration::minutes(2));
        assert_eq!(cache.get(&"shows").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let (cache, _clock) = cache();
        cache.insert("a", 1).await;
        cache.insert("b", 2).await;

        assert!(cache.invalidate(&"a").await);
        assert!(!cache.invalidate(&"a").await);
        assert_eq!(cache.get(&"b").await, Some(2));

        cache.clear().await;
        assert_eq!(cache.get(&"b").await, None);
    }

    #[tokio::test]
    async fn test_get_or_try_insert_fetches_once_while_fresh() {
        let (cache, clock) = cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };

        assert_eq!(cache.get_or_try_insert_with("k", fetch).await.unwrap(), 7);
        assert_eq!(cache.get_or_try_insert_with("k", fetch).await.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::hours(2));
        cache.get_or_try_insert_with("k", fetch).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_errors_are_not_cached() {
        let (cache, _clock) = cache();
        let failed = cache
            .get_or_try_insert_with("k", || async {
                Err(AppError::ExternalApi("down".to_string()))
            })
            .await;
        assert!(failed.is_err());
        assert_eq!(cache.get(&"k").await, None);
    }
}
