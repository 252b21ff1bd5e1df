//! The batch reconciler and its outcome types

pub mod models;
pub mod reconciler;

pub use models::{ack_set, CycleReport, FailedMessage, FailureCause, ProcessingOutcome};
pub use reconciler::BatchReconciler;
