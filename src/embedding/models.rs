//! Wire models for the OpenAI embeddings API

use serde::{Deserialize, Serialize};

/// Request to generate an embedding
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest<'a> {
    /// Model name
    pub model: &'a str,

    /// Text to embed
    pub input: &'a str,

    /// Always "float"; base64 output is not decoded
    pub encoding_format: &'static str,
}

impl<'a> EmbeddingRequest<'a> {
    pub fn new(model: &'a str, input: &'a str) -> Self {
        Self {
            model,
            input,
            encoding_format: "float",
        }
    }
}

/// Response from embedding generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// Generated embeddings
    #[serde(default)]
    pub data: Vec<EmbeddingData>,

    /// Model used for generation
    #[serde(default)]
    pub model: String,

    /// Usage statistics
    #[serde(default)]
    pub usage: Option<UsageStats>,
}

/// Individual embedding data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingData {
    /// Embedding vector; absent or null is treated as empty
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,

    /// Index in the batch
    #[serde(default)]
    pub index: usize,
}

/// Token usage statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageStats {
    pub prompt_tokens: usize,
    pub total_tokens: usize,
}

impl EmbeddingResponse {
    /// The vector for the first input, if the provider returned one
    pub fn into_first_embedding(self) -> Option<Vec<f32>> {
        self.data
            .into_iter()
            .min_by_key(|d| d.index)
            .and_then(|d| d.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = EmbeddingRequest::new("text-embedding-3-small", "hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "text-embedding-3-small",
                "input": "hello",
                "encoding_format": "float"
            })
        );
    }

    #[test]
    fn test_missing_embedding_is_none() {
        let response: EmbeddingResponse = serde_json::from_value(serde_json::json!({
            "object": "list",
            "data": [{"object": "embedding", "index": 0, "embedding": null}],
            "model": "text-embedding-3-small"
        }))
        .unwrap();

        assert_eq!(response.into_first_embedding(), None);
    }

    #[test]
    fn test_empty_data_is_none() {
        let response: EmbeddingResponse =
            serde_json::from_value(serde_json::json!({"data": []})).unwrap();

        assert_eq!(response.into_first_embedding(), None);
    }
}
