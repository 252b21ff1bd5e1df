//! Shared HTTP plumbing for the Supabase REST API (PostgREST)

use crate::config::SupabaseConfig;
use crate::error::{Result, WorkerError};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use secrecy::ExposeSecret;
use std::time::Duration;

/// Authenticated PostgREST client for one Supabase project
#[derive(Clone)]
pub struct SupabaseRest {
    client: Client,
    base_url: String,
}

impl SupabaseRest {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        let key = config.service_role_key.expose_secret();

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key)
                .map_err(|_| WorkerError::Config("Invalid Supabase service role key".to_string()))?,
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", key))
            .map_err(|_| WorkerError::Config("Invalid Supabase service role key".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                WorkerError::Config(format!("Failed to build Supabase HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn http(&self) -> &Client {
        &self.client
    }

    /// URL of a remote procedure call endpoint
    pub fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    /// URL of a table endpoint
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let rest = SupabaseRest::new(&SupabaseConfig {
            url: "https://project.supabase.co/".to_string(),
            service_role_key: Secret::new("key".to_string()),
            timeout_secs: 5,
        })
        .unwrap();

        assert_eq!(rest.rpc_url("read"), "https://project.supabase.co/rest/v1/rpc/read");
        assert_eq!(rest.table_url("responses"), "https://project.supabase.co/rest/v1/responses");
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let result = SupabaseRest::new(&SupabaseConfig {
            url: "https://project.supabase.co".to_string(),
            service_role_key: Secret::new("bad\nkey".to_string()),
            timeout_secs: 5,
        });

        assert!(result.is_err());
    }
}
