// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session projection for the presented access token.

use crate::middleware::auth::optional_user;
use crate::models::SessionState;
use crate::AppState;
use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/session", get(get_session))
}

/// Signed-in user, or the anonymous state when the token is missing or
/// invalid. The server has already heard from the identity provider, so
/// this is never `is_initializing`.
async fn get_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<SessionState> {
    let user = optional_user(&state, &jar, &headers).map(Into::into);
    Json(SessionState::from_user(user))
}
