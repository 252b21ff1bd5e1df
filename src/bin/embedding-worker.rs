//! Embedding Worker Server Binary
//!
//! Serves the trigger endpoint that drains one queue batch per request,
//! together with health and metrics endpoints.

use anyhow::Context;
use embedding_worker::{config::Config, observability::init_observability, server};
use std::path::Path;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let from_file = Path::new(&config_path).exists();
    let config = if from_file {
        Config::from_file_with_env(&config_path)
            .with_context(|| format!("failed to load configuration from {}", config_path))?
    } else {
        Config::from_env().context("failed to load configuration from environment")?
    };

    init_observability(&config.logging.level, &config.logging.format);

    info!("Starting Embedding Worker");
    if from_file {
        info!("Configuration loaded and validated from {}", config_path);
    } else {
        warn!("{} not found, configuration loaded from environment", config_path);
    }

    let state = server::build_state(&config).context("failed to initialize worker")?;
    info!(
        default_batch_size = config.worker.default_batch_size,
        max_batch_size = config.worker.max_batch_size,
        visibility_timeout_secs = config.queue.visibility_timeout_secs,
        "Batch reconciler initialized"
    );

    server::serve(&config, state, shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Starting graceful shutdown");
}
