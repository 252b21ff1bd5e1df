//! Per-message outcomes and the cycle report

use serde::{Deserialize, Serialize};

/// Why a message was left in the queue for retry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureCause {
    #[serde(rename = "provider error")]
    Provider,
    #[serde(rename = "store error")]
    Store,
    /// The unit of work panicked
    #[serde(rename = "worker crash")]
    Crash,
}

/// A message that failed and stays in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedMessage {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub cause: FailureCause,
    pub error: String,
}

/// Result of one message's unit of work
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingOutcome {
    /// Embedding computed and stored; safe to acknowledge
    Success { message_id: i64, record_id: String },
    /// Payload unusable; left in the queue until it expires
    Skipped { message_id: i64, reason: String },
    Failure(FailedMessage),
}

impl ProcessingOutcome {
    pub fn message_id(&self) -> i64 {
        match self {
            ProcessingOutcome::Success { message_id, .. }
            | ProcessingOutcome::Skipped { message_id, .. } => *message_id,
            ProcessingOutcome::Failure(failed) => failed.message_id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

/// Summary returned for one processing cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub success: bool,
    /// Messages whose vector was stored
    pub processed: usize,
    /// Malformed messages left in the queue
    pub skipped: usize,
    pub failed: Vec<FailedMessage>,
    /// Stored but not deleted; these will be redelivered and re-embedded
    #[serde(default)]
    pub unacknowledged: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CycleReport {
    /// Report for a cycle that found nothing to do
    pub fn empty() -> Self {
        Self {
            success: true,
            processed: 0,
            skipped: 0,
            failed: Vec::new(),
            unacknowledged: Vec::new(),
            message: Some("No messages found in the queue".to_string()),
        }
    }

    /// Aggregate joined outcomes and the ids whose delete did not go through
    pub fn from_outcomes(outcomes: Vec<ProcessingOutcome>, unacknowledged: Vec<i64>) -> Self {
        let mut processed = 0;
        let mut skipped = 0;
        let mut failed = Vec::new();

        for outcome in outcomes {
            match outcome {
                ProcessingOutcome::Success { .. } => processed += 1,
                ProcessingOutcome::Skipped { .. } => skipped += 1,
                ProcessingOutcome::Failure(f) => failed.push(f),
            }
        }

        Self {
            success: true,
            processed,
            skipped,
            failed,
            unacknowledged,
            message: None,
        }
    }

    pub fn total(&self) -> usize {
        self.processed + self.skipped + self.failed.len()
    }
}

/// Message ids safe to acknowledge: exactly the successful outcomes
pub fn ack_set(outcomes: &[ProcessingOutcome]) -> Vec<i64> {
    outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(ProcessingOutcome::message_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(id: i64, cause: FailureCause) -> ProcessingOutcome {
        ProcessingOutcome::Failure(FailedMessage {
            message_id: id,
            record_id: Some(format!("r{}", id)),
            cause,
            error: "boom".to_string(),
        })
    }

    #[test]
    fn test_ack_set_only_contains_successes() {
        let outcomes = vec![
            ProcessingOutcome::Success { message_id: 1, record_id: "r1".to_string() },
            failure(2, FailureCause::Provider),
            ProcessingOutcome::Skipped { message_id: 3, reason: "missing text".to_string() },
            failure(4, FailureCause::Store),
            ProcessingOutcome::Success { message_id: 5, record_id: "r5".to_string() },
        ];

        assert_eq!(ack_set(&outcomes), vec![1, 5]);
    }

    #[test]
    fn test_report_counts_every_message_once() {
        let outcomes = vec![
            ProcessingOutcome::Success { message_id: 1, record_id: "r1".to_string() },
            failure(2, FailureCause::Provider),
            ProcessingOutcome::Skipped { message_id: 3, reason: "missing text".to_string() },
        ];

        let report = CycleReport::from_outcomes(outcomes, vec![]);
        assert!(report.success);
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_failure_serializes_cause_text() {
        let report = CycleReport::from_outcomes(vec![failure(2, FailureCause::Provider)], vec![]);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["failed"][0]["message_id"], 2);
        assert_eq!(json["failed"][0]["cause"], "provider error");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_empty_report_shape() {
        let json = serde_json::to_value(CycleReport::empty()).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["processed"], 0);
        assert_eq!(json["skipped"], 0);
        assert_eq!(json["failed"], serde_json::json!([]));
    }
}
