//! Message queue integration (pgmq)

pub mod models;
pub mod pgmq;

pub use models::{EmbeddingJob, QueueMessage};
pub use pgmq::PgmqClient;

use async_trait::async_trait;
use crate::error::Result;
use std::time::Duration;

/// Trait for the queue feeding the worker
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Read up to `n` messages, hiding them from other consumers for
    /// `visibility_timeout`
    async fn read(&self, n: usize, visibility_timeout: Duration) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a message by deleting it
    async fn delete(&self, message_id: i64) -> Result<()>;

    /// Name of the queue, for logging
    fn queue_name(&self) -> &str;
}
