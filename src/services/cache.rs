// src/services/cache.rs
// DOCUMENTATION: In-memory cache for slow-changing directory lists
// PURPOSE: Serve categories, countries and cities from memory until they go stale

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::errors::DirectoryError;

pub const CATEGORIES_PREFIX: &str = "categories:";
pub const COUNTRIES_PREFIX: &str = "countries:";
pub const CITIES_PREFIX: &str = "cities:";

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Simple in-memory cache with TTL
/// DOCUMENTATION: Thread-safe store of serialized JSON lists
pub struct DirectoryCache {
    store: Arc<RwLock<HashMap<String, CacheEntry<String>>>>,
    default_ttl: Duration,
}

impl DirectoryCache {
    /// Create new cache with default TTL
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            default_ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub fn categories_key(locale: &str) -> String {
        format!("{}{}", CATEGORIES_PREFIX, locale)
    }

    pub fn countries_key(locale: &str) -> String {
        format!("{}{}", COUNTRIES_PREFIX, locale)
    }

    pub fn cities_key(country_code: &str, locale: &str) -> String {
        format!("{}{}:{}", CITIES_PREFIX, country_code.to_uppercase(), locale)
    }

    /// Get cached value
    pub async fn get(&self, key: &str) -> Option<String> {
        let store = self.store.read().await;

        if let Some(entry) = store.get(key) {
            if !entry.is_expired() {
                log::debug!("Cache HIT for key: {}", key);
                return Some(entry.data.clone());
            } else {
                log::debug!("Cache EXPIRED for key: {}", key);
            }
        } else {
            log::debug!("Cache MISS for key: {}", key);
        }

        None
    }

    /// Set cached value with default TTL
    pub async fn set(&self, key: String, value: String) {
        self.set_with_ttl(key, value, self.default_ttl).await;
    }

    /// Set cached value with custom TTL
    pub async fn set_with_ttl(&self, key: String, value: String, ttl: Duration) {
        let mut store = self.store.write().await;
        store.insert(key.clone(), CacheEntry::new(value, ttl));
        log::debug!("Cache SET for key: {} (TTL: {}s)", key, ttl.as_secs());
    }

    /// Return the cached list or load, store and return it
    /// DOCUMENTATION: Entries that fail to deserialize are reloaded
    pub async fn get_or_load<T, F, Fut>(&self, key: &str, load: F) -> Result<T, DirectoryError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DirectoryError>>,
    {
        if let Some(raw) = self.get(key).await {
            match serde_json::from_str(&raw) {
                Ok(value) => return Ok(value),
                Err(e) => log::warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let value = load().await?;
        match serde_json::to_string(&value) {
            Ok(raw) => self.set(key.to_string(), raw).await,
            Err(e) => log::warn!("Could not cache {}: {}", key, e),
        }
        Ok(value)
    }

    /// Drop every entry whose key starts with `prefix`
    pub async fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|key, _| !key.starts_with(prefix));
        let removed = before - store.len();
        if removed > 0 {
            log::info!("Cache invalidated {} entries under '{}'", removed, prefix);
        }
        removed
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
        }
    }

    /// Clear all cache entries
    pub async fn clear(&self) {
        let mut store = self.store.write().await;
        let count = store.len();
        store.clear();
        log::info!("Cache cleared: {} entries removed", count);
    }
}

/// Cache statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<DirectoryCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = DirectoryCache::new(60);
        let key = DirectoryCache::categories_key("fr");

        cache.set(key.clone(), "[]".to_string()).await;
        assert_eq!(cache.get(&key).await, Some("[]".to_string()));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = DirectoryCache::new(60);
        let key = "short".to_string();

        cache
            .set_with_ttl(key.clone(), "value".to_string(), Duration::from_millis(50))
            .await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get(&key).await.is_none());

        cache.cleanup().await;
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[tokio::test]
    async fn test_get_or_load_only_loads_once() {
        let cache = DirectoryCache::new(60);
        let calls = std::sync::atomic::AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_load("countries:en", || async {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(vec!["Morocco".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["Morocco".to_string()]);
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_load_does_not_cache_errors() {
        let cache = DirectoryCache::new(60);
        let result: Result<Vec<String>, _> = cache
            .get_or_load("countries:en", || async {
                Err(DirectoryError::DatabaseError("down".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert!(cache.get("countries:en").await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_prefix() {
        let cache = DirectoryCache::new(60);
        cache.set(DirectoryCache::cities_key("ma", "en"), "[]".into()).await;
        cache.set(DirectoryCache::cities_key("MA", "fr"), "[]".into()).await;
        cache.set(DirectoryCache::countries_key("en"), "[]".into()).await;

        assert_eq!(cache.invalidate_prefix(CITIES_PREFIX).await, 2);

        let stats = cache.stats().await;
        assert_eq!(stats.active_entries, 1);
    }
}
