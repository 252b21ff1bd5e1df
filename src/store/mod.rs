//! Record store: the table rows that receive computed vectors

pub mod postgrest;

pub use postgrest::PostgrestRecordStore;

use async_trait::async_trait;
use crate::error::Result;

/// Trait for durable vector storage
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Attach `vector` to the record identified by `record_id`.
    /// Returns only once the write is durable.
    async fn update_vector(&self, record_id: &str, vector: &[f32]) -> Result<()>;
}
