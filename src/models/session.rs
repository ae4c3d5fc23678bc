//! Session projection of the identity provider's current user.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserInfo {
    /// Identity provider user ID
    pub id: String,
    /// Email address (may be None for federated accounts without one)
    pub email: Option<String>,
}

/// Read-only view of the auth state, shared with the rest of the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionState {
    pub is_authenticated: bool,
    pub current_user: Option<UserInfo>,
    pub is_initializing: bool,
}

impl SessionState {
    /// State before the identity provider has reported anything.
    pub fn initializing() -> Self {
        Self {
            is_authenticated: false,
            current_user: None,
            is_initializing: true,
        }
    }

    /// State after an auth event: signed in when a user is present.
    pub fn from_user(user: Option<UserInfo>) -> Self {
        Self {
            is_authenticated: user.is_some(),
            current_user: user,
            is_initializing: false,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initializing()
    }
}
