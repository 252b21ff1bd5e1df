//! Configuration loader with environment variable support

use super::Config;
use crate::error::Result;
use config::{Environment, File};
use std::path::Path;

/// Prefix for environment overrides, e.g. `EMBEDDING_WORKER__QUEUE__QUEUE_NAME`
pub const ENV_PREFIX: &str = "EMBEDDING_WORKER";

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}

/// Load configuration from a TOML file with environment variable overrides
pub fn load_config_with_env<P: AsRef<Path>>(path: P) -> Result<Config> {
    let config = config::Config::builder()
        .add_source(File::from(path.as_ref()))
        .add_source(env_source())
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}

/// Load configuration from built-in defaults with environment variable overrides
pub fn load_config_from_env() -> Result<Config> {
    let defaults = config::Config::try_from(&Config::default_config())?;

    let config = config::Config::builder()
        .add_source(defaults)
        .add_source(env_source())
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::io::Write;

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "embedding-worker-{}.toml",
            uuid::Uuid::new_v4()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_file_applies_defaults() {
        let path = write_config(
            r#"
            [embedding]
            api_key = "sk-test"

            [supabase]
            url = "https://project.supabase.co"
            service_role_key = "service-key"
            "#,
        );

        let config = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.embedding.api_key.expose_secret(), "sk-test");
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.queue.queue_name, "response_embeddings");
        assert_eq!(config.queue.schema, "pgmq_public");
        assert_eq!(config.queue.visibility_timeout_secs, 120);
        assert_eq!(config.store.table, "responses");
        assert_eq!(config.store.vector_column, "embedding");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_missing_credentials_fail_to_load() {
        let path = write_config(
            r#"
            [embedding]
            model = "text-embedding-3-small"
            "#,
        );

        let result = load_config(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
