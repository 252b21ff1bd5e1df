//! Queue message and payload models

use crate::error::MessageError;
use crate::middleware::InputValidator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message as delivered by pgmq
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueMessage {
    /// Queue-assigned id, unique per in-flight delivery
    pub msg_id: i64,

    /// Number of times the message has been read
    #[serde(default)]
    pub read_ct: i32,

    #[serde(default)]
    pub enqueued_at: Option<DateTime<Utc>>,

    /// Time the message becomes visible again
    #[serde(default)]
    pub vt: Option<DateTime<Utc>>,

    /// Raw payload; parsed lazily so one bad message cannot fail the read
    #[serde(default)]
    pub message: Value,
}

/// Parsed payload: which record to update and the text to embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingJob {
    pub record_id: String,
    pub text: String,
}

impl QueueMessage {
    pub fn new(msg_id: i64, message: Value) -> Self {
        Self {
            msg_id,
            read_ct: 1,
            enqueued_at: None,
            vt: None,
            message,
        }
    }

    /// Extract the embedding job from the payload `{ "id": .., "text": .. }`
    pub fn job(&self) -> Result<EmbeddingJob, MessageError> {
        let payload = self
            .message
            .as_object()
            .ok_or_else(|| MessageError::Malformed("payload is not an object".to_string()))?;

        let record_id = match payload.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(_) => {
                return Err(MessageError::Malformed(
                    "id must be a string or integer".to_string(),
                ))
            }
            None => return Err(MessageError::Malformed("missing id".to_string())),
        };

        InputValidator::validate_record_id(&record_id)
            .map_err(|e| MessageError::Malformed(e.to_string()))?;

        let text = match payload.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(MessageError::Malformed("text must be a string".to_string())),
            None => return Err(MessageError::Malformed("missing text".to_string())),
        };

        // Length limits belong to the provider; only a blank text is malformed
        if text.trim().is_empty() {
            return Err(MessageError::Malformed("text is blank".to_string()));
        }

        Ok(EmbeddingJob { record_id, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_pgmq_row() {
        let row = json!({
            "msg_id": 17,
            "read_ct": 2,
            "enqueued_at": "2024-05-01T10:00:00.123456+00:00",
            "vt": "2024-05-01T10:02:00.123456+00:00",
            "message": {"id": "resp-1", "text": "Great support team"}
        });

        let msg: QueueMessage = serde_json::from_value(row).unwrap();
        assert_eq!(msg.msg_id, 17);
        assert_eq!(msg.read_ct, 2);
        assert!(msg.enqueued_at.is_some());
        assert_eq!(
            msg.job().unwrap(),
            EmbeddingJob {
                record_id: "resp-1".to_string(),
                text: "Great support team".to_string()
            }
        );
    }

    #[test]
    fn test_numeric_id_is_accepted() {
        let msg = QueueMessage::new(1, json!({"id": 42, "text": "hi"}));
        assert_eq!(msg.job().unwrap().record_id, "42");
    }

    #[test]
    fn test_malformed_payloads() {
        let cases = [
            json!(null),
            json!("just a string"),
            json!({"text": "no id"}),
            json!({"id": "r1"}),
            json!({"id": "", "text": "empty id"}),
            json!({"id": true, "text": "bool id"}),
            json!({"id": "r1", "text": 5}),
            json!({"id": "r1", "text": "   "}),
        ];

        for payload in cases {
            let msg = QueueMessage::new(1, payload.clone());
            assert!(
                matches!(msg.job(), Err(MessageError::Malformed(_))),
                "expected malformed for {}",
                payload
            );
        }
    }

    #[test]
    fn test_oversized_text_is_not_malformed() {
        let text = "a".repeat(crate::middleware::validator::MAX_TEXT_LENGTH + 1);
        let msg = QueueMessage::new(1, json!({"id": "r1", "text": text}));
        assert_eq!(msg.job().unwrap().text.len(), text.len());
    }

    #[test]
    fn test_row_without_message_still_decodes() {
        let msg: QueueMessage = serde_json::from_value(json!({"msg_id": 3})).unwrap();
        assert!(msg.job().is_err());
    }
}
