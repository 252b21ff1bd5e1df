//! Circuit breaker guarding the embedding provider
//!
//! When the provider is down every message in a batch would otherwise wait out
//! its own retries. Once the breaker opens, remaining units fail immediately and
//! their messages stay in the queue.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests flow normally
    Closed,

    /// Requests are rejected
    Open,

    /// Probing whether the provider recovered
    HalfOpen,
}

impl CircuitState {
    fn gauge(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::HalfOpen => 1,
            CircuitState::Open => 2,
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: usize,

    /// Successes in half-open state that close it again
    pub success_threshold: usize,

    /// Time the circuit stays open before a probe is allowed
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_rejected: u64,
    pub current_failures: usize,
}

pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    success_count: AtomicUsize,
    opened_at: RwLock<Option<Instant>>,
    total_calls: AtomicU64,
    total_failures: AtomicU64,
    total_rejected: AtomicU64,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            success_count: AtomicUsize::new(0),
            opened_at: RwLock::new(None),
            total_calls: AtomicU64::new(0),
            total_failures: AtomicU64::new(0),
            total_rejected: AtomicU64::new(0),
        }
    }

    /// Check if a request should be allowed
    pub async fn allow_request(&self) -> bool {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        let state = *self.state.read().await;

        match state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let cooled_down = self
                    .opened_at
                    .read()
                    .await
                    .map(|at| at.elapsed() >= self.config.timeout)
                    .unwrap_or(false);

                if cooled_down {
                    let mut state = self.state.write().await;
                    if *state == CircuitState::Open {
                        *state = CircuitState::HalfOpen;
                        self.success_count.store(0, Ordering::Relaxed);
                        debug!("Circuit breaker transitioning to half-open state");
                    }
                    return true;
                }

                self.total_rejected.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Record a successful operation
    pub async fn record_success(&self) {
        let state = *self.state.read().await;

        match state {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Relaxed);
            }
            CircuitState::HalfOpen => {
                let successes = self.success_count.fetch_add(1, Ordering::Relaxed) + 1;

                if successes >= self.config.success_threshold {
                    *self.state.write().await = CircuitState::Closed;
                    self.failure_count.store(0, Ordering::Relaxed);
                    self.success_count.store(0, Ordering::Relaxed);
                    debug!("Circuit breaker closed after successful recovery");
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Record a failed operation
    pub async fn record_failure(&self) {
        self.total_failures.fetch_add(1, Ordering::Relaxed);

        let state = *self.state.read().await;

        match state {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;

                if failures >= self.config.failure_threshold {
                    self.open().await;
                    warn!("Circuit breaker opened after {} failures", failures);
                }
            }
            CircuitState::HalfOpen => {
                self.open().await;
                self.success_count.store(0, Ordering::Relaxed);
                warn!("Circuit breaker reopened after failure in half-open state");
            }
            CircuitState::Open => {}
        }
    }

    async fn open(&self) {
        *self.state.write().await = CircuitState::Open;
        *self.opened_at.write().await = Some(Instant::now());
    }

    pub async fn state(&self) -> CircuitState {
        *self.state.read().await
    }

    pub async fn stats(&self) -> CircuitBreakerStats {
        CircuitBreakerStats {
            state: *self.state.read().await,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            total_failures: self.total_failures.load(Ordering::Relaxed),
            total_rejected: self.total_rejected.load(Ordering::Relaxed),
            current_failures: self.failure_count.load(Ordering::Relaxed),
        }
    }

    /// Export breaker state as Prometheus text (state gauge: 0=closed, 1=half-open, 2=open)
    pub async fn export_prometheus(&self, name: &str) -> String {
        let stats = self.stats().await;

        format!(
            "# HELP {name}_state Circuit breaker state (0=closed, 1=half-open, 2=open)\n\
             # TYPE {name}_state gauge\n\
             {name}_state {}\n\
             \n\
             # HELP {name}_calls_total Total calls through circuit breaker\n\
             # TYPE {name}_calls_total counter\n\
             {name}_calls_total {}\n\
             \n\
             # HELP {name}_failures_total Total failures\n\
             # TYPE {name}_failures_total counter\n\
             {name}_failures_total {}\n\
             \n\
             # HELP {name}_rejected_total Calls rejected while open\n\
             # TYPE {name}_rejected_total counter\n\
             {name}_rejected_total {}\n",
            stats.state.gauge(),
            stats.total_calls,
            stats.total_failures,
            stats.total_rejected,
        )
    }
}
