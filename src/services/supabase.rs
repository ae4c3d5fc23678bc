// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Minimal Supabase REST client shared by the storage and row store gateways.
//!
//! Handles:
//! - Project base URL + API key headers
//! - Error body extraction (storage and PostgREST shapes)

use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Supabase HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// Non-success response from a Supabase endpoint.
#[derive(Debug, Clone)]
pub struct ApiFailure {
    /// HTTP status of the response
    pub status: u16,
    /// Provider error code (`"Duplicate"`, `"23505"`, ...) when present
    pub code: Option<String>,
    /// Provider message, kept verbatim
    pub message: String,
}

impl ApiFailure {
    /// Whether the provider reported a duplicate/conflict.
    pub fn is_conflict(&self) -> bool {
        self.status == 409
            || matches!(self.code.as_deref(), Some("409") | Some("Duplicate") | Some("23505"))
    }
}

/// Storage errors look like `{statusCode, error, message}`; PostgREST
/// errors look like `{code, message, details, hint}`.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default, rename = "statusCode")]
    status_code: Option<serde_json::Value>,
}

impl SupabaseClient {
    /// Create a client for the project at `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Absolute URL for a path below the project base.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request builder with the project API key attached.
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Turn a non-success response into an [`ApiFailure`].
    pub async fn check_response(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiFailure> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(parse_failure(status, &body))
    }
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_failure(status: u16, body: &str) -> ApiFailure {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let message = parsed
                .message
                .clone()
                .or_else(|| parsed.error.clone())
                .unwrap_or_else(|| format!("HTTP {}", status));
            // Storage puts the real status in `statusCode`, the name in `error`.
            let code = parsed
                .status_code
                .and_then(value_to_string)
                .filter(|c| c == "409")
                .or_else(|| parsed.code.and_then(value_to_string))
                .or(parsed.error);
            ApiFailure {
                status,
                code,
                message,
            }
        }
        Err(_) => ApiFailure {
            status,
            code: None,
            message: if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                format!("HTTP {}: {}", status, body.trim())
            },
        },
    }
}
