//! Embedding Worker - queue-driven vector generation for database records
//!
//! Each trigger drains one batch of jobs from a pgmq queue, embeds the
//! referenced text through an OpenAI-compatible provider, writes the vectors
//! back to the owning rows over PostgREST, and acknowledges exactly the
//! messages whose vectors were persisted.
//!
//! ## Features
//!
//! - **Per-message isolation**: one failing or panicking job never affects its siblings
//! - **At-least-once delivery**: unacknowledged jobs reappear after the visibility timeout
//! - **Circuit Breaker Protection**: the embedding provider is guarded against cascading failures
//! - **Embedding cache**: redelivered jobs with unchanged text skip the provider
//! - **Observability**: structured logging, Prometheus metrics and health checks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use embedding_worker::prelude::*;
//! use embedding_worker::server::build_state;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::from_env()?;
//!     let state = build_state(&config)?;
//!
//!     let report = state.reconciler.run_cycle(config.worker.default_batch_size).await?;
//!     println!("processed {} jobs", report.processed);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod embedding;
pub mod error;
pub mod middleware;
pub mod observability;
pub mod queue;
pub mod server;
pub mod store;
pub mod supabase;
pub mod worker;

pub use config::Config;
pub use error::{Result, WorkerError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::embedding::{EmbeddingClient, EmbeddingProvider};
    pub use crate::error::{Result, WorkerError};
    pub use crate::middleware::InputValidator;
    pub use crate::observability::{HealthChecker, MetricsCollector};
    pub use crate::queue::{EmbeddingJob, MessageQueue, PgmqClient, QueueMessage};
    pub use crate::store::{PostgrestRecordStore, RecordStore};
    pub use crate::worker::{BatchReconciler, CycleReport, ProcessingOutcome};
}
