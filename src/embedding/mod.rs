//! Embedding provider: turns text into a fixed-length vector

pub mod cache;
pub mod circuit_breaker;
pub mod client;
pub mod models;

pub use cache::{CacheStats, EmbeddingCache};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use client::EmbeddingClient;
pub use models::{EmbeddingRequest, EmbeddingResponse};

use async_trait::async_trait;
use crate::error::Result;

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text. An empty vector is never
    /// returned as success.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the dimension of embeddings
    fn embedding_dimension(&self) -> usize;
}
