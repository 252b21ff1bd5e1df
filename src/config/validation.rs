//! Configuration validation

use super::*;
use crate::error::{WorkerError, Result};

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_embedding_config(&config.embedding)?;
    validate_supabase_config(&config.supabase)?;
    validate_queue_config(&config.queue)?;
    validate_store_config(&config.store)?;
    validate_worker_config(&config.worker)?;
    validate_server_config(&config.server)?;
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate embedding configuration
fn validate_embedding_config(config: &EmbeddingConfig) -> Result<()> {
    if config.api_url.is_empty() {
        return Err(WorkerError::Config(
            "Embedding API URL cannot be empty".to_string()
        ));
    }

    if !is_http_url(&config.api_url) {
        return Err(WorkerError::Config(
            "Embedding API URL must start with http:// or https://".to_string()
        ));
    }

    if config.api_key.expose_secret().is_empty() {
        return Err(WorkerError::Config(
            "Embedding API key is required".to_string()
        ));
    }

    if config.model.trim().is_empty() {
        return Err(WorkerError::Config(
            "Embedding model cannot be empty".to_string()
        ));
    }

    if config.dimensions == 0 {
        return Err(WorkerError::Config(
            "Embedding dimensions must be greater than 0".to_string()
        ));
    }

    if config.dimensions > 4096 {
        return Err(WorkerError::Config(
            "Embedding dimensions too large (max: 4096)".to_string()
        ));
    }

    if config.timeout_secs == 0 {
        return Err(WorkerError::Config(
            "Embedding timeout must be greater than 0".to_string()
        ));
    }

    if config.timeout_secs > 300 {
        return Err(WorkerError::Config(
            "Embedding timeout too large (max: 300 seconds)".to_string()
        ));
    }

    if config.max_retries == 0 {
        return Err(WorkerError::Config(
            "Max retries must allow at least one attempt".to_string()
        ));
    }

    if config.max_retries > 10 {
        return Err(WorkerError::Config(
            "Max retries too large (max: 10)".to_string()
        ));
    }

    if config.cache_enabled {
        if config.cache_size == 0 {
            return Err(WorkerError::Config(
                "Cache size must be greater than 0 when cache is enabled".to_string()
            ));
        }

        if config.cache_ttl_secs == 0 {
            return Err(WorkerError::Config(
                "Cache TTL must be greater than 0 when cache is enabled".to_string()
            ));
        }
    }

    if config.circuit_breaker_enabled && config.circuit_breaker_threshold == 0 {
        return Err(WorkerError::Config(
            "Circuit breaker threshold must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate Supabase configuration
fn validate_supabase_config(config: &SupabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(WorkerError::Config(
            "Supabase URL cannot be empty".to_string()
        ));
    }

    if !is_http_url(&config.url) {
        return Err(WorkerError::Config(
            "Supabase URL must start with http:// or https://".to_string()
        ));
    }

    if config.service_role_key.expose_secret().is_empty() {
        return Err(WorkerError::Config(
            "Supabase service role key is required".to_string()
        ));
    }

    if config.timeout_secs == 0 || config.timeout_secs > 300 {
        return Err(WorkerError::Config(
            "Supabase timeout must be between 1 and 300 seconds".to_string()
        ));
    }

    Ok(())
}

/// Validate queue configuration
fn validate_queue_config(config: &QueueConfig) -> Result<()> {
    if config.schema.is_empty() {
        return Err(WorkerError::Config(
            "Queue schema cannot be empty".to_string()
        ));
    }

    if config.queue_name.is_empty() {
        return Err(WorkerError::Config(
            "Queue name cannot be empty".to_string()
        ));
    }

    if config.visibility_timeout_secs == 0 {
        return Err(WorkerError::Config(
            "Visibility timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate record store configuration
fn validate_store_config(config: &StoreConfig) -> Result<()> {
    for (name, value) in [
        ("table", &config.table),
        ("id_column", &config.id_column),
        ("vector_column", &config.vector_column),
    ] {
        if value.is_empty() {
            return Err(WorkerError::Config(format!("Store {} cannot be empty", name)));
        }

        if !value.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(WorkerError::Config(format!(
                "Store {} must contain only alphanumeric characters or underscores",
                name
            )));
        }
    }

    Ok(())
}

/// Validate batch limits
fn validate_worker_config(config: &WorkerConfig) -> Result<()> {
    if config.max_batch_size == 0 {
        return Err(WorkerError::Config(
            "Max batch size must be greater than 0".to_string()
        ));
    }

    if config.max_batch_size > 1000 {
        return Err(WorkerError::Config(
            "Max batch size too large (max: 1000)".to_string()
        ));
    }

    if config.default_batch_size == 0 || config.default_batch_size > config.max_batch_size {
        return Err(WorkerError::Config(format!(
            "Default batch size must be between 1 and {}",
            config.max_batch_size
        )));
    }

    Ok(())
}

/// Validate server configuration
pub fn validate_server_config(config: &ServerConfig) -> Result<()> {
    if config.port == 0 {
        return Err(WorkerError::Config(
            "Server port cannot be 0".to_string()
        ));
    }

    if config.host.is_empty() {
        return Err(WorkerError::Config(
            "Server host cannot be empty".to_string()
        ));
    }

    Ok(())
}
