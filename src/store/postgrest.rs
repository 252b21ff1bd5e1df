//! Record store backed by a PostgREST table (Supabase)

use super::RecordStore;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::supabase::SupabaseRest;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, error};

/// Writes vectors with `PATCH /rest/v1/{table}?{id_column}=eq.{record_id}`
pub struct PostgrestRecordStore {
    rest: SupabaseRest,
    config: StoreConfig,
}

impl PostgrestRecordStore {
    pub fn new(rest: SupabaseRest, config: StoreConfig) -> Self {
        Self { rest, config }
    }

    fn update_body(&self, vector: &[f32]) -> Value {
        let mut body = Map::new();
        body.insert(
            self.config.vector_column.clone(),
            Value::from(vector.to_vec()),
        );
        Value::Object(body)
    }
}

#[async_trait]
impl RecordStore for PostgrestRecordStore {
    async fn update_vector(&self, record_id: &str, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(StoreError::InvalidVector(record_id.to_string()).into());
        }

        let filter = format!("eq.{}", record_id);
        let response = self
            .rest
            .http()
            .patch(self.rest.table_url(&self.config.table))
            .query(&[(self.config.id_column.as_str(), filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(&self.update_body(vector))
            .send()
            .await
            .map_err(StoreError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(record_id, %status, "Failed to update record: {}", body);
            return Err(StoreError::UpdateFailed {
                record_id: record_id.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        debug!(record_id, dimension = vector.len(), "Stored embedding");
        Ok(())
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

    fn store(url: String) -> PostgrestRecordStore {
        let rest = SupabaseRest::new(&SupabaseConfig {
            url,
            service_role_key: Secret::new("service-key".to_string()),
            timeout_secs: 5,
        })
        .unwrap();
        PostgrestRecordStore::new(rest, StoreConfig::default())
    }

    #[tokio::test]
    async fn test_update_patches_matching_row() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/rest/v1/responses")
            .match_query(Matcher::UrlEncoded("id".into(), "eq.resp-1".into()))
            .match_header("apikey", "service-key")
            .match_header("prefer", "return=minimal")
            .match_body(Matcher::Json(json!({"embedding": [0.5, 0.25]})))
            .with_status(204)
            .create_async()
            .await;

        store(server.url())
            .update_vector("resp-1", &[0.5, 0.25])
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_failure_carries_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PATCH", "/rest/v1/responses")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"message":"expected 1536 dimensions, not 2"}"#)
            .create_async()
            .await;

        let err = store(server.url())
            .update_vector("resp-1", &[0.5, 0.25])
            .await
            .unwrap_err();

        match err {
            WorkerError::Store(StoreError::UpdateFailed { record_id, status, body }) => {
                assert_eq!(record_id, "resp-1");
                assert_eq!(status, 400);
                assert!(body.contains("1536"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_vector_is_rejected_locally() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let result = store(server.url()).update_vector("resp-1", &[]).await;

        assert!(matches!(result, Err(WorkerError::Store(StoreError::InvalidVector(_)))));
        mock.assert_async().await;
    }
}
