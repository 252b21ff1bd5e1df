//! Batch reconciliation: decide which queue messages are safe to acknowledge
//!
//! One cycle reads a batch, runs one task per message (embed, then store),
//! joins every task, and only then deletes the messages whose vector was
//! stored. Anything else stays in the queue and is redelivered once its
//! visibility timeout lapses.

use super::models::{ack_set, CycleReport, FailedMessage, FailureCause, ProcessingOutcome};
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::observability::MetricsCollector;
use crate::queue::{MessageQueue, QueueMessage};
use crate::store::RecordStore;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

/// Orchestrates one processing cycle over the three collaborators
pub struct BatchReconciler {
    queue: Arc<dyn MessageQueue>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RecordStore>,
    visibility_timeout: Duration,
    metrics: Option<Arc<MetricsCollector>>,
}

impl BatchReconciler {
    pub fn new(
        queue: Arc<dyn MessageQueue>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn RecordStore>,
        visibility_timeout: Duration,
    ) -> Self {
        Self {
            queue,
            embedder,
            store,
            visibility_timeout,
            metrics: None,
        }
    }

    /// Set metrics collector
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Read one batch of at most `max_batch_size` messages and reconcile it.
    ///
    /// Only a failed queue read is returned as an error; no provider or
    /// store call is made in that case.
    pub async fn run_cycle(&self, max_batch_size: usize) -> Result<CycleReport> {
        let span = info_span!(
            "cycle",
            cycle_id = %Uuid::new_v4(),
            queue = self.queue.queue_name(),
            max_batch_size
        );

        async move {
            let started = Instant::now();
            info!("Processing embeddings");

            let batch = match self.queue.read(max_batch_size, self.visibility_timeout).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!("Failed to read from queue: {}", e);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_cycle_error();
                    }
                    return Err(e);
                }
            };

            info!("Read {} messages from the queue", batch.len());

            let report = self.reconcile(batch).await;

            if let Some(metrics) = &self.metrics {
                metrics.record_cycle(&report, started.elapsed());
            }

            info!(
                processed = report.processed,
                skipped = report.skipped,
                failed = report.failed.len(),
                unacknowledged = report.unacknowledged.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Cycle complete"
            );

            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Process an already-read batch and acknowledge what was stored
    pub async fn reconcile(&self, batch: Vec<QueueMessage>) -> CycleReport {
        if batch.is_empty() {
            info!("No messages found in the queue");
            return CycleReport::empty();
        }

        let outcomes = self.process_batch(batch).await;

        let to_ack = ack_set(&outcomes);
        let unacknowledged = if to_ack.is_empty() {
            Vec::new()
        } else {
            info!("Deleting {} processed messages from the queue", to_ack.len());
            self.acknowledge(&to_ack).await
        };

        CycleReport::from_outcomes(outcomes, unacknowledged)
    }

    /// Fan out one task per message and join them all.
    ///
    /// Outcomes come back in batch order, one per message, so no shared
    /// collector is needed.
    async fn process_batch(&self, batch: Vec<QueueMessage>) -> Vec<ProcessingOutcome> {
        let message_ids: Vec<i64> = batch.iter().map(|m| m.msg_id).collect();

        let handles: Vec<_> = batch
            .into_iter()
            .map(|message| {
                let unit = process_message(
                    message,
                    self.embedder.clone(),
                    self.store.clone(),
                    self.metrics.clone(),
                );
                tokio::spawn(unit.instrument(Span::current()))
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(message_ids)
            .map(|(joined, message_id)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(message_id, "Unit of work crashed: {}", e);
                    ProcessingOutcome::Failure(FailedMessage {
                        message_id,
                        record_id: None,
                        cause: FailureCause::Crash,
                        error: e.to_string(),
                    })
                }
            })
            .collect()
    }

    /// Delete every acknowledged message; returns the ids whose delete failed.
    ///
    /// A failed delete does not undo the stored vector. The message will be
    /// redelivered and embedded again.
    async fn acknowledge(&self, message_ids: &[i64]) -> Vec<i64> {
        let deletes = message_ids.iter().map(|&message_id| async move {
            match self.queue.delete(message_id).await {
                Ok(()) => None,
                Err(e) => {
                    warn!(message_id, "Failed to delete message: {}", e);
                    if let Some(metrics) = &self.metrics {
                        metrics.record_delete_failure();
                    }
                    Some(message_id)
                }
            }
        });

        join_all(deletes).await.into_iter().flatten().collect()
    }
}

/// One message's unit of work. Never returns an error: every failure becomes
/// an outcome for this message only.
async fn process_message(
    message: QueueMessage,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn RecordStore>,
    metrics: Option<Arc<MetricsCollector>>,
) -> ProcessingOutcome {
    let message_id = message.msg_id;

    let job = match message.job() {
        Ok(job) => job,
        Err(e) => {
            warn!(message_id, read_ct = message.read_ct, "Skipping message: {}", e);
            return ProcessingOutcome::Skipped {
                message_id,
                reason: e.to_string(),
            };
        }
    };

    debug!(message_id, record_id = %job.record_id, "Processing embedding");

    let started = Instant::now();
    let embedded = embedder.embed(&job.text).await;
    if let Some(metrics) = &metrics {
        metrics.record_embedding_latency(started.elapsed());
    }

    let vector = match embedded {
        Ok(vector) if !vector.is_empty() => vector,
        Ok(_) => {
            let reason = "Provider returned an empty embedding";
            warn!(message_id, record_id = %job.record_id, "{}", reason);
            return failure(message_id, job.record_id, FailureCause::Provider, reason.to_string());
        }
        Err(e) => {
            warn!(message_id, record_id = %job.record_id, "Failed to generate embedding: {}", e);
            return failure(message_id, job.record_id, FailureCause::Provider, e.to_string());
        }
    };

    let started = Instant::now();
    let stored = store.update_vector(&job.record_id, &vector).await;
    if let Some(metrics) = &metrics {
        metrics.record_store_latency(started.elapsed());
    }

    match stored {
        Ok(()) => {
            debug!(message_id, record_id = %job.record_id, "Stored embedding");
            ProcessingOutcome::Success {
                message_id,
                record_id: job.record_id,
            }
        }
        Err(e) => {
            error!(message_id, record_id = %job.record_id, "Failed to update record: {}", e);
            failure(message_id, job.record_id, FailureCause::Store, e.to_string())
        }
    }
}

fn failure(
    message_id: i64,
    record_id: String,
    cause: FailureCause,
    error: String,
) -> ProcessingOutcome {
    ProcessingOutcome::Failure(FailedMessage {
        message_id,
        record_id: Some(record_id),
        cause,
        error,
    })
}
