use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Cache key of the stock list query.
pub const STOCKS_QUERY_KEY: &str = "stocks";

const INVALIDATION_BUFFER: usize = 64;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

/// Keyed cache of the last fetched query results.
///
/// Invalidating a key marks its entry stale and broadcasts the key, so views holding a
/// subscription know to fetch again. Writes are last-write-wins.
#[derive(Clone)]
pub struct QueryCache<V> {
    entries: Arc<DashMap<String, CacheEntry<V>>>,
    invalidations: broadcast::Sender<String>,
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        let (invalidations, _) = broadcast::channel(INVALIDATION_BUFFER);
        Self {
            entries: Arc::new(DashMap::new()),
            invalidations,
        }
    }

    pub fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Missing entries count as stale.
    pub fn is_stale(&self, key: &str) -> bool {
        self.entries.get(key).map_or(true, |entry| entry.stale)
    }

    pub fn set(&self, key: &str, value: V) {
        debug!("Caching query result for '{}'", key);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: Utc::now(),
                stale: false,
            },
        );
    }

    /// Marks `key` stale and notifies subscribers. Subscribers hear about uncached keys
    /// too: a failed fetch leaves no entry behind. Returns whether an entry was marked.
    pub fn invalidate(&self, key: &str) -> bool {
        let marked = match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.stale = true;
                true
            }
            None => false,
        };

        debug!("Invalidated query '{}' (cached: {})", key, marked);
        // No receivers just means no view is mounted.
        let _ = self.invalidations.send(key.to_string());
        marked
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.invalidations.subscribe()
    }

    /// Returns the cached value while it is fresh, otherwise runs `fetcher` and caches
    /// its result. A failed fetch leaves the existing entry untouched.
    pub async fn fetch<F, Fut, E>(&self, key: &str, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(entry) = self.entries.get(key) {
            if !entry.stale {
                return Ok(entry.value.clone());
            }
        }

        let value = fetcher().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
