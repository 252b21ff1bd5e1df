//! In-process embedding cache backed by moka
//!
//! A store failure leaves its message in the queue and the text is embedded
//! again on redelivery. Within the TTL that second embedding is served from
//! here instead of the provider.

use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Statistics about cache performance
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Async cache of embeddings keyed by model and text digest
pub struct EmbeddingCache {
    cache: Cache<String, Vec<f32>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    /// Create a new cache with specified capacity and TTL
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        info!("Initializing embedding cache with max_size={}, ttl={:?}", max_size, ttl);

        let cache = Cache::builder()
            .max_capacity(max_size as u64)
            .time_to_live(ttl)
            .build();

        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cache key for a text embedded with a given model
    pub fn key(model: &str, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(model.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        format!("emb_{:x}", hasher.finalize())
    }

    /// Get embedding from cache
    pub async fn get(&self, key: &str) -> Option<Vec<f32>> {
        let result = self.cache.get(key).await;

        if result.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for key: {}", key);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Store embedding in cache
    pub async fn put(&self, key: String, embedding: Vec<f32>) {
        self.cache.insert(key, embedding).await;
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;

        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            size: self.cache.entry_count() as usize,
            hits,
            misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
        }
    }
}
