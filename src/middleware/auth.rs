// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access token authentication middleware.
//!
//! Tokens are issued by the identity provider (HS256, shared secret); this
//! service only verifies them.

use crate::models::UserInfo;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie that may carry the access token instead of the header.
pub const TOKEN_COOKIE: &str = "jani_token";
/// Audience the identity provider puts on user access tokens.
pub const TOKEN_AUDIENCE: &str = "authenticated";

/// Access token claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (identity provider user ID)
    pub sub: String,
    /// Email, when the account has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Audience
    pub aud: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from the access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
}

impl From<AuthUser> for UserInfo {
    fn from(user: AuthUser) -> Self {
        UserInfo {
            id: user.user_id,
            email: user.email,
        }
    }
}

/// Pull the raw token from the cookie or the `Authorization` header.
fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Verify `token` and return the user it belongs to.
pub fn verify_token(token: &str, signing_key: &[u8]) -> Option<AuthUser> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[TOKEN_AUDIENCE]);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    if token_data.claims.sub.trim().is_empty() {
        return None;
    }

    Some(AuthUser {
        user_id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

/// Resolve the user for a request without requiring one.
pub fn optional_user(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Option<AuthUser> {
    let token = extract_token(jar, headers)?;
    verify_token(&token, &state.config.jwt_signing_key)
}

/// Middleware that requires a valid access token.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_user =
        optional_user(&state, &jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
