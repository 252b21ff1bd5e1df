//! Wiring: build clients from configuration and serve the router

use crate::{
    api::{build_router, AppState},
    config::Config,
    embedding::{EmbeddingClient, EmbeddingProvider},
    error::Result,
    observability::{HealthChecker, MetricsCollector},
    queue::PgmqClient,
    store::PostgrestRecordStore,
    supabase::SupabaseRest,
    worker::BatchReconciler,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Construct every collaborator and the shared application state
pub fn build_state(config: &Config) -> Result<AppState> {
    let metrics = Arc::new(MetricsCollector::new());

    let embedding_client = Arc::new(EmbeddingClient::new(config.embedding.clone())?);
    info!("Embedding client initialized");

    let rest = SupabaseRest::new(&config.supabase)?;
    let queue = Arc::new(PgmqClient::new(rest.clone(), config.queue.clone()));
    let store = Arc::new(PostgrestRecordStore::new(rest, config.store.clone()));
    info!(
        queue = %config.queue.queue_name,
        table = %config.store.table,
        "Queue and record store clients initialized"
    );

    let health_checker = Arc::new(
        HealthChecker::new()
            .with_cache(embedding_client.cache())
            .with_circuit_breaker(embedding_client.circuit_breaker())
            .with_embedding_client(embedding_client.clone() as Arc<dyn EmbeddingProvider>),
    );

    let reconciler = BatchReconciler::new(
        queue,
        embedding_client,
        store,
        Duration::from_secs(config.queue.visibility_timeout_secs),
    )
    .with_metrics(metrics.clone());

    Ok(AppState {
        reconciler: Arc::new(reconciler),
        health_checker,
        metrics,
        limits: config.worker.clone(),
    })
}

/// Bind and serve until `shutdown` resolves
pub async fn serve<F>(config: &Config, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, config.server.max_body_size_mb * 1024 * 1024);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[tokio::test]
    async fn test_build_state_from_config() {
        let mut config = Config::default_config();
        config.embedding.api_key = Secret::new("sk-test".to_string());
        config.supabase.service_role_key = Secret::new("service-key".to_string());
        config.worker.default_batch_size = 7;

        let state = build_state(&config).unwrap();
        assert_eq!(state.limits.default_batch_size, 7);
        assert!(state.health_checker.circuit_breaker().is_some());
    }
}
