//! Content-addressed translation cache
//!
//! Results are keyed by `(source, target, register, sha256(text))`, so a hit
//! can never return a translation of different text: the key embeds the full
//! content. Entries are immutable for their TTL window; rewriting a key
//! stores the same value, so concurrent duplicate writes are last-write-wins
//! safe.

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::trace;

use babelon_core::traits::CacheStore;

/// Cache key for one `(source, target, register, text)` combination.
pub fn cache_key(source_lang: &str, target_lang: &str, register: &str, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("translation:{source_lang}:{target_lang}:{register}:{digest:x}")
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

/// In-process [`CacheStore`] with per-entry TTL and an LRU capacity bound.
///
/// This is the default store for single-process deployments; a shared
/// external key-value store can replace it behind the same trait without
/// touching the dispatcher.
pub struct InMemoryCacheStore {
    entries: Mutex<LruCache<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.lock().await;
        entries.put(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

/// Memoization layer the dispatcher reads and writes through.
///
/// Thin wrapper tying a [`CacheStore`] to the configured TTL so call sites
/// never pass the lifetime around.
#[derive(Clone)]
pub struct TranslationCache {
    store: std::sync::Arc<dyn CacheStore>,
    ttl: Duration,
}

impl TranslationCache {
    pub fn new(store: std::sync::Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Cached translation for this exact text/language/register combination.
    pub async fn lookup(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        register: &str,
    ) -> Option<String> {
        let key = cache_key(source_lang, target_lang, register, text);
        let hit = self.store.get(&key).await;
        if hit.is_some() {
            trace!("cache hit for {key}");
        }
        hit
    }

    /// Record a translation result with the configured TTL.
    pub async fn store(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        register: &str,
        translated: String,
    ) {
        let key = cache_key(source_lang, target_lang, register, text);
        self.store.set(&key, translated, self.ttl).await;
    }
}
