//! Health check reporting

use crate::embedding::{CircuitBreaker, CircuitState, EmbeddingCache, EmbeddingProvider};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Health status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Component health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl ComponentHealth {
    fn new(name: &str, status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: Some(message.into()),
        }
    }
}

/// Overall system health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: HealthStatus,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
    pub timestamp: i64,
}

#[derive(Debug, Clone)]
struct CachedHealth {
    result: SystemHealth,
    cached_at: Instant,
}

/// Health checker with result caching
pub struct HealthChecker {
    start_time: Instant,
    embedding_client: Option<Arc<dyn EmbeddingProvider>>,
    cache: Option<Arc<EmbeddingCache>>,
    circuit_breaker: Option<Arc<CircuitBreaker>>,
    cached_result: RwLock<Option<CachedHealth>>,
    cache_ttl: Duration,
}

impl HealthChecker {
    /// Create a new health checker with default 30-second cache TTL
    pub fn new() -> Self {
        Self::with_cache_ttl(Duration::from_secs(30))
    }

    pub fn with_cache_ttl(cache_ttl: Duration) -> Self {
        Self {
            start_time: Instant::now(),
            embedding_client: None,
            cache: None,
            circuit_breaker: None,
            cached_result: RwLock::new(None),
            cache_ttl,
        }
    }

    pub fn with_embedding_client(mut self, embedding_client: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_client = Some(embedding_client);
        self
    }

    pub fn with_cache(mut self, cache: Option<Arc<EmbeddingCache>>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Option<Arc<CircuitBreaker>>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    pub fn circuit_breaker(&self) -> Option<Arc<CircuitBreaker>> {
        self.circuit_breaker.clone()
    }

    /// Check overall system health with caching
    pub async fn check_health(&self) -> SystemHealth {
        {
            let cached = self.cached_result.read().await;
            if let Some(cached_health) = &*cached {
                if cached_health.cached_at.elapsed() < self.cache_ttl {
                    debug!("Returning cached health check result");
                    return cached_health.result.clone();
                }
            }
        }

        let health = self.perform_health_check().await;

        *self.cached_result.write().await = Some(CachedHealth {
            result: health.clone(),
            cached_at: Instant::now(),
        });

        health
    }

    async fn perform_health_check(&self) -> SystemHealth {
        let mut components = vec![self.check_embedding_service()];

        if let Some(cb) = &self.circuit_breaker {
            components.push(Self::check_circuit_breaker(cb).await);
        }

        if let Some(cache) = &self.cache {
            components.push(Self::check_cache(cache).await);
        }

        let status = if components.iter().all(|c| c.status == HealthStatus::Healthy) {
            HealthStatus::Healthy
        } else if components.iter().any(|c| c.status == HealthStatus::Unhealthy) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        };

        SystemHealth {
            status,
            uptime_secs: self.start_time.elapsed().as_secs(),
            components,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    fn check_embedding_service(&self) -> ComponentHealth {
        match &self.embedding_client {
            Some(client) if client.embedding_dimension() > 0 => ComponentHealth::new(
                "embedding_service",
                HealthStatus::Healthy,
                format!("Configured (dim: {})", client.embedding_dimension()),
            ),
            Some(_) => ComponentHealth::new(
                "embedding_service",
                HealthStatus::Unhealthy,
                "Invalid embedding dimension",
            ),
            None => {
                ComponentHealth::new("embedding_service", HealthStatus::Degraded, "Not configured")
            }
        }
    }

    async fn check_circuit_breaker(cb: &CircuitBreaker) -> ComponentHealth {
        let (status, message) = match cb.state().await {
            CircuitState::Closed => (HealthStatus::Healthy, "Circuit closed - normal operation"),
            CircuitState::Open => (HealthStatus::Unhealthy, "Circuit open - provider unavailable"),
            CircuitState::HalfOpen => {
                (HealthStatus::Degraded, "Circuit half-open - testing recovery")
            }
        };

        ComponentHealth::new("embedding_circuit_breaker", status, message)
    }

    async fn check_cache(cache: &EmbeddingCache) -> ComponentHealth {
        let stats = cache.stats().await;

        ComponentHealth::new(
            "embedding_cache",
            HealthStatus::Healthy,
            format!(
                "Cache operational (hit rate: {:.1}%, size: {})",
                stats.hit_rate * 100.0,
                stats.size
            ),
        )
    }

    /// Simple liveness check
    pub fn liveness(&self) -> bool {
        true
    }

    /// Readiness check
    pub async fn readiness(&self) -> bool {
        self.check_health().await.status != HealthStatus::Unhealthy
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::CircuitBreakerConfig;
    use crate::error::Result;
    use async_trait::async_trait;

    struct FixedDimension(usize);

    #[async_trait]
    impl EmbeddingProvider for FixedDimension {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![0.0; self.0])
        }

        fn embedding_dimension(&self) -> usize {
            self.0
        }
    }

    #[tokio::test]
    async fn test_unconfigured_is_degraded() {
        let checker = HealthChecker::new();
        let health = checker.check_health().await;

        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.components.len(), 1);
        assert!(checker.readiness().await);
    }

    #[tokio::test]
    async fn test_configured_is_healthy() {
        let checker = HealthChecker::new()
            .with_embedding_client(Arc::new(FixedDimension(1536)))
            .with_circuit_breaker(Some(Arc::new(CircuitBreaker::new(
                CircuitBreakerConfig::default(),
            ))))
            .with_cache(Some(Arc::new(EmbeddingCache::new(10, Duration::from_secs(60)))));

        let health = checker.check_health().await;
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.components.len(), 3);
    }

    #[tokio::test]
    async fn test_open_circuit_is_not_ready() {
        let cb = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..CircuitBreakerConfig::default()
        }));
        cb.record_failure().await;

        let checker = HealthChecker::with_cache_ttl(Duration::ZERO)
            .with_embedding_client(Arc::new(FixedDimension(1536)))
            .with_circuit_breaker(Some(cb));

        assert_eq!(checker.check_health().await.status, HealthStatus::Unhealthy);
        assert!(!checker.readiness().await);
    }

    #[test]
    fn test_liveness() {
        assert!(HealthChecker::new().liveness());
    }
}
