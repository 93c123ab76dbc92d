use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::instrument;

use crate::error::FetchError;
use crate::models::{Query, WeatherSeries};
use crate::weather::WeatherSource;

/// Hit/miss counters of a [`QueryCache`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Thread-safe in-memory key/value cache without eviction.
///
/// Entries live as long as the process. The lock is never held across an
/// `.await`.
pub struct QueryCache<T> {
    entries: RwLock<HashMap<String, T>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<T: Clone> QueryCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Retrieves a value if it exists.
    pub fn get(&self, key: &str) -> Option<T> {
        let value = self.entries.read().get(key).cloned();
        if value.is_some() {
            tracing::debug!(key, "Key found");
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            tracing::debug!(key, "Key not found");
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Stores a value, replacing any previous entry for the key.
    pub fn put(&self, key: impl Into<String>, value: T) {
        self.entries.write().insert(key.into(), value);
    }

    /// Manually removes a key from the cache.
    pub fn remove(&self, key: &str) -> Option<T> {
        self.entries.write().remove(key)
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<T: Clone> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Memoizes a [`WeatherSource`] by query.
///
/// Identical queries are answered from memory. Failed fetches are not
/// stored, so the next identical query goes to the network again.
pub struct CachedWeatherFetcher<S> {
    source: S,
    cache: QueryCache<WeatherSeries>,
}

impl<S: WeatherSource> CachedWeatherFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: QueryCache::new(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[async_trait]
impl<S: WeatherSource> WeatherSource for CachedWeatherFetcher<S> {
    #[instrument(name = "cached_fetch", level = "debug", skip(self, query))]
    async fn fetch(&self, query: &Query) -> Result<WeatherSeries, FetchError> {
        let key = query.cache_key();

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let series = self.source.fetch(query).await?;
        self.cache.put(key, series.clone());
        Ok(series)
    }
}
