//! pgmq client over the Supabase `pgmq_public` RPC schema

use super::{MessageQueue, QueueMessage};
use crate::config::QueueConfig;
use crate::error::{QueueError, Result};
use crate::supabase::SupabaseRest;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Serialize)]
struct ReadArgs<'a> {
    queue_name: &'a str,
    sleep_seconds: u64,
    n: usize,
}

#[derive(Debug, Serialize)]
struct DeleteArgs<'a> {
    queue_name: &'a str,
    message_id: i64,
}

/// Queue client calling `pgmq_public.read` and `pgmq_public.delete`
pub struct PgmqClient {
    rest: SupabaseRest,
    config: QueueConfig,
}

impl PgmqClient {
    pub fn new(rest: SupabaseRest, config: QueueConfig) -> Self {
        Self { rest, config }
    }

    fn rpc(&self, function: &str) -> reqwest::RequestBuilder {
        self.rest
            .http()
            .post(self.rest.rpc_url(function))
            .header("Content-Profile", &self.config.schema)
            .header("Accept-Profile", &self.config.schema)
    }
}

#[async_trait]
impl MessageQueue for PgmqClient {
    async fn read(&self, n: usize, visibility_timeout: Duration) -> Result<Vec<QueueMessage>> {
        debug!(queue = %self.config.queue_name, n, "Reading from queue");

        let response = self
            .rpc("read")
            .json(&ReadArgs {
                queue_name: &self.config.queue_name,
                sleep_seconds: visibility_timeout.as_secs(),
                n,
            })
            .send()
            .await
            .map_err(|e| QueueError::Read(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Queue read failed with status {}: {}", status, body);
            return Err(QueueError::Read(format!("Status {}: {}", status, body)).into());
        }

        let messages: Option<Vec<QueueMessage>> = response
            .json()
            .await
            .map_err(|e| QueueError::Read(format!("invalid response: {}", e)))?;

        Ok(messages.unwrap_or_default())
    }

    async fn delete(&self, message_id: i64) -> Result<()> {
        let response = self
            .rpc("delete")
            .json(&DeleteArgs {
                queue_name: &self.config.queue_name,
                message_id,
            })
            .send()
            .await
            .map_err(QueueError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QueueError::Delete(format!(
                "message {}: status {}: {}",
                message_id, status, body
            ))
            .into());
        }

        let deleted: bool = response
            .json()
            .await
            .map_err(|e| QueueError::Decode(e.to_string()))?;

        if !deleted {
            return Err(QueueError::NotFound(message_id).into());
        }

        debug!(message_id, "Deleted message from queue");
        Ok(())
    }

    fn queue_name(&self) -> &str {
        &self.config.queue_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SupabaseConfig;
    use crate::error::WorkerError;
    use mockito::Matcher;
    use secrecy::Secret;
    use serde_json::json;

    fn client(url: String) -> PgmqClient {
        let rest = SupabaseRest::new(&SupabaseConfig {
            url,
            service_role_key: Secret::new("service-key".to_string()),
            timeout_secs: 5,
        })
        .unwrap();
        PgmqClient::new(rest, QueueConfig::default())
    }

    #[tokio::test]
    async fn test_read_sends_rpc_and_parses_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/rpc/read")
            .match_header("apikey", "service-key")
            .match_header("authorization", "Bearer service-key")
            .match_header("content-profile", "pgmq_public")
            .match_body(Matcher::Json(json!({
                "queue_name": "response_embeddings",
                "sleep_seconds": 120,
                "n": 5
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"msg_id": 1, "read_ct": 1, "enqueued_at": "2024-05-01T10:00:00+00:00",
                     "vt": "2024-05-01T10:02:00+00:00", "message": {"id": "a", "text": "x"}},
                    {"msg_id": 2, "read_ct": 1, "enqueued_at": "2024-05-01T10:00:00+00:00",
                     "vt": "2024-05-01T10:02:00+00:00", "message": {"id": "b", "text": "y"}}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let messages = client(server.url())
            .read(5, Duration::from_secs(120))
            .await
            .unwrap();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].msg_id, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_null_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/read")
            .with_status(200)
            .with_body("null")
            .create_async()
            .await;

        let messages = client(server.url()).read(5, Duration::from_secs(120)).await.unwrap();
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_is_fatal_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/read")
            .with_status(404)
            .with_body(r#"{"message":"relation does not exist"}"#)
            .create_async()
            .await;

        let err = client(server.url())
            .read(5, Duration::from_secs(120))
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("relation does not exist"));
    }

    #[tokio::test]
    async fn test_delete_true_is_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/rpc/delete")
            .match_body(Matcher::Json(json!({
                "queue_name": "response_embeddings",
                "message_id": 9
            })))
            .with_status(200)
            .with_body("true")
            .create_async()
            .await;

        client(server.url()).delete(9).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_false_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/rest/v1/rpc/delete")
            .with_status(200)
            .with_body("false")
            .create_async()
            .await;

        let err = client(server.url()).delete(9).await.unwrap_err();
        assert!(matches!(err, WorkerError::Queue(QueueError::NotFound(9))));
        assert!(!err.is_fatal());
    }
}
