//! Input validation for requests and queued payloads

use tracing::{debug, warn};

/// Maximum text length accepted for embedding (OpenAI input limit is 8191 tokens)
pub const MAX_TEXT_LENGTH: usize = 32_768;

/// Maximum record id length
const MAX_RECORD_ID_LENGTH: usize = 256;

/// Input validator
pub struct InputValidator;

impl InputValidator {
    /// Validate text to embed
    pub fn validate_text(text: &str) -> Result<(), ValidationError> {
        if text.trim().is_empty() {
            warn!("Validation failed: empty text");
            return Err(ValidationError::EmptyInput);
        }

        if text.len() > MAX_TEXT_LENGTH {
            warn!("Validation failed: text too long ({} > {})", text.len(), MAX_TEXT_LENGTH);
            return Err(ValidationError::TextTooLong {
                length: text.len(),
                max_length: MAX_TEXT_LENGTH,
            });
        }

        debug!("Text validation passed");
        Ok(())
    }

    /// Validate a record id taken from a queued payload
    pub fn validate_record_id(id: &str) -> Result<(), ValidationError> {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyRecordId);
        }

        if id.len() > MAX_RECORD_ID_LENGTH {
            return Err(ValidationError::RecordIdTooLong {
                length: id.len(),
                max_length: MAX_RECORD_ID_LENGTH,
            });
        }

        if id.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidCharacters);
        }

        Ok(())
    }

    /// Validate a requested batch size against the configured ceiling
    pub fn validate_batch_size(size: usize, max: usize) -> Result<(), ValidationError> {
        if size == 0 {
            warn!("Validation failed: empty batch");
            return Err(ValidationError::EmptyBatch);
        }

        if size > max {
            warn!("Validation failed: batch too large ({} > {})", size, max);
            return Err(ValidationError::BatchTooLarge {
                size,
                max_size: max,
            });
        }

        debug!("Batch size validation passed");
        Ok(())
    }

    /// Validate vector dimension
    pub fn validate_vector_dimension(
        actual: usize,
        expected: usize,
    ) -> Result<(), ValidationError> {
        if actual != expected {
            warn!("Validation failed: invalid vector dimension ({} != {})", actual, expected);
            return Err(ValidationError::InvalidVectorDimension {
                actual,
                expected,
            });
        }

        Ok(())
    }
}

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Input text is empty")]
    EmptyInput,

    #[error("Text too long: {length} bytes (max: {max_length})")]
    TextTooLong { length: usize, max_length: usize },

    #[error("Input contains invalid control characters")]
    InvalidCharacters,

    #[error("Record id is empty")]
    EmptyRecordId,

    #[error("Record id too long: {length} (max: {max_length})")]
    RecordIdTooLong { length: usize, max_length: usize },

    #[error("max_batch_size must be greater than 0")]
    EmptyBatch,

    #[error("max_batch_size too large: {size} (max: {max_size})")]
    BatchTooLarge { size: usize, max_size: usize },

    #[error("Invalid vector dimension: {actual} (expected: {expected})")]
    InvalidVectorDimension { actual: usize, expected: usize },
}
