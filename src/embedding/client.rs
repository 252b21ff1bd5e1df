//! Embedding client for the OpenAI embeddings API

use super::{models::*, CircuitBreaker, CircuitBreakerConfig, EmbeddingCache, EmbeddingProvider};
use crate::config::EmbeddingConfig;
use crate::error::{EmbeddingError, Result};
use crate::middleware::InputValidator;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Client for generating embeddings via an OpenAI-compatible API
pub struct EmbeddingClient {
    config: EmbeddingConfig,
    http_client: Client,
    cache: Option<Arc<EmbeddingCache>>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
}

impl EmbeddingClient {
    /// Create a new embedding client
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(EmbeddingError::NetworkError)?;

        Self::with_http_client(config, http_client)
    }

    /// Create client with custom HTTP client
    pub fn with_http_client(config: EmbeddingConfig, http_client: Client) -> Result<Self> {
        let cache = config.cache_enabled.then(|| {
            Arc::new(EmbeddingCache::new(
                config.cache_size,
                Duration::from_secs(config.cache_ttl_secs),
            ))
        });

        let circuit_breaker = config.circuit_breaker_enabled.then(|| {
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
                failure_threshold: config.circuit_breaker_threshold,
                timeout: Duration::from_secs(config.circuit_breaker_cooldown_secs),
                ..CircuitBreakerConfig::default()
            }))
        });

        info!(
            model = %config.model,
            cache_enabled = config.cache_enabled,
            circuit_breaker_enabled = config.circuit_breaker_enabled,
            "Initialized embedding client"
        );

        Ok(Self {
            config,
            http_client,
            cache,
            circuit_breaker,
        })
    }

    /// Shared handle to the cache, if enabled
    pub fn cache(&self) -> Option<Arc<EmbeddingCache>> {
        self.cache.clone()
    }

    /// Shared handle to the circuit breaker, if enabled
    pub fn circuit_breaker(&self) -> Option<Arc<CircuitBreaker>> {
        self.circuit_breaker.clone()
    }

    /// Make API request with retry logic
    async fn make_request(&self, text: &str) -> Result<EmbeddingResponse> {
        if let Some(cb) = &self.circuit_breaker {
            if !cb.allow_request().await {
                warn!("Circuit breaker is open, rejecting embedding request");
                return Err(EmbeddingError::ServiceUnavailable(
                    "Circuit breaker open".to_string(),
                )
                .into());
            }
        }

        let mut attempts = 0;

        loop {
            attempts += 1;

            match self.try_request(text).await {
                Ok(response) => {
                    debug!("Embedding request succeeded on attempt {}", attempts);
                    if let Some(cb) = &self.circuit_breaker {
                        cb.record_success().await;
                    }
                    return Ok(response);
                }
                Err(e) => {
                    let retryable = is_retryable(&e);
                    warn!("Embedding request failed on attempt {}: {}", attempts, e);

                    if retryable && attempts < self.config.max_retries {
                        let delay = backoff_delay(attempts);
                        debug!("Retrying after {}ms", delay.as_millis());
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if let Some(cb) = &self.circuit_breaker {
                        cb.record_failure().await;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Try to make a single API request
    async fn try_request(
        &self,
        text: &str,
    ) -> std::result::Result<EmbeddingResponse, EmbeddingError> {
        let request = EmbeddingRequest::new(&self.config.model, text);

        let response = self.http_client
            .post(&self.config.api_url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();

        match status {
            s if s.is_success() => Ok(response.json::<EmbeddingResponse>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Authentication failed");
                Err(EmbeddingError::AuthenticationFailed)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(EmbeddingError::RateLimitExceeded),
            _ => {
                let error_text = response.text().await.unwrap_or_default();
                error!("API request failed with status {}: {}", status, error_text);
                Err(EmbeddingError::ApiError {
                    status: status.as_u16(),
                    body: error_text,
                })
            }
        }
    }
}

fn is_retryable(err: &EmbeddingError) -> bool {
    match err {
        EmbeddingError::NetworkError(e) => !e.is_decode(),
        EmbeddingError::RateLimitExceeded => true,
        EmbeddingError::ApiError { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Exponential backoff with +/-25% jitter, capped at 30 seconds
fn backoff_delay(attempt: u32) -> Duration {
    let base_delay = 100u64.saturating_mul(2_u64.saturating_pow(attempt - 1));
    let delay = base_delay.min(30_000);
    let jitter = (delay as f64 * 0.5 * (rand::random::<f64>() - 0.5)) as i64;
    Duration::from_millis((delay as i64 + jitter).max(0) as u64)
}

#[async_trait]
impl EmbeddingProvider for EmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        InputValidator::validate_text(text)
            .map_err(|e| EmbeddingError::InvalidInput(e.to_string()))?;

        let key = EmbeddingCache::key(&self.config.model, text);
        if let Some(cache) = &self.cache {
            if let Some(embedding) = cache.get(&key).await {
                debug!("Cache hit for embedding");
                return Ok(embedding);
            }
        }

        let response = self.make_request(text).await?;

        let embedding = match response.into_first_embedding() {
            Some(embedding) if !embedding.is_empty() => embedding,
            _ => {
                error!("Provider returned no embedding");
                return Err(EmbeddingError::EmptyEmbedding.into());
            }
        };

        if InputValidator::validate_vector_dimension(embedding.len(), self.config.dimensions)
            .is_err()
        {
            return Err(EmbeddingError::InvalidDimension {
                expected: self.config.dimensions,
                actual: embedding.len(),
            }
            .into());
        }

        if let Some(cache) = &self.cache {
            cache.put(key, embedding.clone()).await;
        }

        Ok(embedding)
    }

    fn embedding_dimension(&self) -> usize {
        self.config.dimensions
    }
}
