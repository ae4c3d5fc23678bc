// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! When `SUPABASE_URL` is unset the service runs against in-memory
//! gateways, which is the normal mode for local development and tests.

use std::env;

/// Default object storage bucket for report photos.
pub const DEFAULT_STORAGE_BUCKET: &str = "jani-images";
/// Default row store table for reports.
pub const DEFAULT_REPORTS_TABLE: &str = "Jani";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Supabase project URL (None = in-memory gateways)
    pub supabase_url: Option<String>,
    /// Object storage bucket name
    pub storage_bucket: String,
    /// Row store table name
    pub reports_table: String,
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Base URL for public object URLs in in-memory mode
    pub public_base_url: String,
    /// Server port
    pub port: u16,
    /// Delete the uploaded photo again when the row insert fails
    pub orphan_cleanup: bool,

    // --- Secrets ---
    /// API key sent to Supabase (service key preferred over anon key)
    pub supabase_api_key: String,
    /// HS256 secret for verifying identity provider access tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self::test_default()
    }
}

impl Config {
    /// Deterministic configuration for tests: in-memory gateways, fixed key.
    pub fn test_default() -> Self {
        Self {
            supabase_url: None,
            storage_bucket: DEFAULT_STORAGE_BUCKET.to_string(),
            reports_table: DEFAULT_REPORTS_TABLE.to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            public_base_url: "http://localhost:8080".to_string(),
            port: 8080,
            orphan_cleanup: false,
            supabase_api_key: "test_api_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let supabase_url = env::var("SUPABASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty());

        // The key is only needed when talking to a real project.
        let supabase_api_key = env::var("SUPABASE_SERVICE_KEY")
            .or_else(|_| env::var("SUPABASE_ANON_KEY"))
            .map(|v| v.trim().to_string());
        let supabase_api_key = match (&supabase_url, supabase_api_key) {
            (_, Ok(key)) => key,
            (Some(_), Err(_)) => return Err(ConfigError::Missing("SUPABASE_ANON_KEY")),
            (None, Err(_)) => String::new(),
        };

        Ok(Self {
            supabase_url,
            storage_bucket: env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| DEFAULT_STORAGE_BUCKET.to_string()),
            reports_table: env::var("REPORTS_TABLE")
                .unwrap_or_else(|_| DEFAULT_REPORTS_TABLE.to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            port,
            orphan_cleanup: env::var("ORPHAN_CLEANUP")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            supabase_api_key,
            jwt_signing_key: env::var("SUPABASE_JWT_SECRET")
                .map_err(|_| ConfigError::Missing("SUPABASE_JWT_SECRET"))?
                .into_bytes(),
        })
    }

    /// Whether the hosted gateways are configured.
    pub fn uses_supabase(&self) -> bool {
        self.supabase_url.is_some()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
