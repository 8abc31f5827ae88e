use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// In-memory cache of query embeddings
///
/// Profiles with the same condition list embed to the same query text, so
/// repeated searches skip the embedding round-trip. Only vectors are cached,
/// never match results.
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: moka::future::Cache<String, Arc<Vec<f32>>>,
}

impl EmbeddingCache {
    /// Create a new cache bounded to `capacity` entries
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { cache }
    }

    pub async fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        let key = CacheKey::query(text);
        let hit = self.cache.get(&key).await;
        if hit.is_some() {
            tracing::trace!("Embedding cache hit: {}", key);
        }
        hit
    }

    pub async fn insert(&self, text: &str, vector: Arc<Vec<f32>>) {
        let key = CacheKey::query(text);
        self.cache.insert(key, vector).await;
    }

    pub async fn invalidate(&self, text: &str) {
        self.cache.invalidate(&CacheKey::query(text)).await;
    }

    /// Get cache statistics, after applying pending inserts and evictions
    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            entries: self.cache.entry_count(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: u64,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a query embedding
    pub fn query(text: &str) -> String {
        format!("query:{}", text)
    }
}
