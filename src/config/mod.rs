//! Configuration management for the embedding worker

use serde::{Deserialize, Serialize};
use std::path::Path;
use secrecy::{Secret, ExposeSecret};

pub mod loader;
pub mod validation;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Configuration for the embedding provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// OpenAI-compatible embeddings endpoint URL
    #[serde(default = "default_embedding_url")]
    pub api_url: String,

    /// Provider API key (secured)
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub api_key: Secret<String>,

    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Expected vector dimension
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Enable caching
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,

    /// Cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Cache maximum size
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Fail fast once the provider keeps failing
    #[serde(default = "default_circuit_breaker_enabled")]
    pub circuit_breaker_enabled: bool,

    /// Consecutive failures before the circuit opens
    #[serde(default = "default_circuit_breaker_threshold")]
    pub circuit_breaker_threshold: usize,

    /// Seconds the circuit stays open before probing again
    #[serde(default = "default_circuit_breaker_cooldown")]
    pub circuit_breaker_cooldown_secs: u64,
}

/// Supabase project credentials shared by the queue and the record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL
    pub url: String,

    /// Service role key (secured)
    #[serde(serialize_with = "serialize_secret", deserialize_with = "deserialize_secret")]
    pub service_role_key: Secret<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// pgmq queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// PostgREST schema exposing the pgmq functions
    #[serde(default = "default_queue_schema")]
    pub schema: String,

    /// Queue name
    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Seconds a read message stays invisible to other consumers
    #[serde(default = "default_visibility_timeout")]
    pub visibility_timeout_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            schema: default_queue_schema(),
            queue_name: default_queue_name(),
            visibility_timeout_secs: default_visibility_timeout(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Table holding the records
    #[serde(default = "default_store_table")]
    pub table: String,

    /// Primary key column matched against the message record id
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Column receiving the vector
    #[serde(default = "default_vector_column")]
    pub vector_column: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: default_store_table(),
            id_column: default_id_column(),
            vector_column: default_vector_column(),
        }
    }
}

/// Batch processing limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Batch size used when the request does not name one
    #[serde(default = "default_batch_size")]
    pub default_batch_size: usize,

    /// Largest batch a single request may ask for
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            default_batch_size: default_batch_size(),
            max_batch_size: default_max_batch_size(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Server host
    #[serde(default = "default_server_host")]
    pub host: String,

    /// Maximum request body size in MB (0 = unlimited)
    #[serde(default = "default_max_body_size")]
    pub max_body_size_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            host: default_server_host(),
            max_body_size_mb: default_max_body_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_embedding_url() -> String { "https://api.openai.com/v1/embeddings".to_string() }
fn default_model() -> String { "text-embedding-3-small".to_string() }
fn default_dimensions() -> usize { 1536 }
fn default_timeout() -> u64 { 30 }
fn default_max_retries() -> u32 { 3 }
fn default_cache_enabled() -> bool { true }
fn default_cache_ttl() -> u64 { 3600 }
fn default_cache_size() -> usize { 1000 }
fn default_circuit_breaker_enabled() -> bool { true }
fn default_circuit_breaker_threshold() -> usize { 5 }
fn default_circuit_breaker_cooldown() -> u64 { 60 }
fn default_queue_schema() -> String { "pgmq_public".to_string() }
fn default_queue_name() -> String { "response_embeddings".to_string() }
fn default_visibility_timeout() -> u64 { 120 } // 2 minutes
fn default_store_table() -> String { "responses".to_string() }
fn default_id_column() -> String { "id".to_string() }
fn default_vector_column() -> String { "embedding".to_string() }
fn default_batch_size() -> usize { 10 }
fn default_max_batch_size() -> usize { 100 }
fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }
fn default_server_port() -> u16 { 8080 }
fn default_server_host() -> String { "0.0.0.0".to_string() }
fn default_max_body_size() -> usize { 1 }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        let config = loader::load_config_with_env(path)?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from defaults and the environment only
    pub fn from_env() -> crate::error::Result<Self> {
        let config = loader::load_config_from_env()?;
        validation::validate_config(&config)?;
        Ok(config)
    }

    /// Validate this configuration
    pub fn validate(&self) -> crate::error::Result<()> {
        validation::validate_config(self)
    }

    /// Create default configuration, seeding credentials from the
    /// conventional `OPENAI_API_KEY`, `SUPABASE_URL` and
    /// `SUPABASE_SERVICE_ROLE_KEY` variables
    pub fn default_config() -> Self {
        Self {
            embedding: EmbeddingConfig {
                api_url: default_embedding_url(),
                api_key: Secret::new(std::env::var("OPENAI_API_KEY").unwrap_or_default()),
                model: default_model(),
                dimensions: default_dimensions(),
                timeout_secs: default_timeout(),
                max_retries: default_max_retries(),
                cache_enabled: default_cache_enabled(),
                cache_ttl_secs: default_cache_ttl(),
                cache_size: default_cache_size(),
                circuit_breaker_enabled: default_circuit_breaker_enabled(),
                circuit_breaker_threshold: default_circuit_breaker_threshold(),
                circuit_breaker_cooldown_secs: default_circuit_breaker_cooldown(),
            },
            supabase: SupabaseConfig {
                url: std::env::var("SUPABASE_URL")
                    .unwrap_or_else(|_| "http://localhost:54321".to_string()),
                service_role_key: Secret::new(
                    std::env::var("SUPABASE_SERVICE_ROLE_KEY").unwrap_or_default(),
                ),
                timeout_secs: default_timeout(),
            },
            queue: QueueConfig::default(),
            store: StoreConfig::default(),
            worker: WorkerConfig::default(),
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Custom serializer for Secret<String>
fn serialize_secret<S>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

/// Custom deserializer for Secret<String>
fn deserialize_secret<'de, D>(deserializer: D) -> Result<Secret<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(Secret::new(s))
}
