//! HTTP surface: the trigger endpoint plus health and metrics

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, GenerateEmbeddingsRequest};
pub use routes::build_router;
