// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session provider: projects the identity provider's auth-state stream into
//! a [`SessionState`] shared with the rest of the app.

use crate::models::{SessionState, UserInfo};
use futures_util::stream::{self, BoxStream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Identity provider capability: a stream of auth-state changes.
///
/// Each item is the current user (`None` when signed out). The first item is
/// the provider's initial determination.
pub trait SessionSource: Send + Sync {
    fn subscribe(&self) -> BoxStream<'static, Option<UserInfo>>;
}

/// Where the identity provider stands right now.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AuthState {
    /// Provider has not reported yet.
    Pending,
    SignedOut,
    SignedIn(UserInfo),
}

/// In-process [`SessionSource`] driven by explicit sign-in/sign-out calls.
pub struct ChannelSessionSource {
    tx: watch::Sender<AuthState>,
}

impl Default for ChannelSessionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelSessionSource {
    /// Source that has not yet determined the auth state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(AuthState::Pending);
        Self { tx }
    }

    pub fn sign_in(&self, user: UserInfo) {
        self.tx.send_replace(AuthState::SignedIn(user));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(AuthState::SignedOut);
    }
}

impl SessionSource for ChannelSessionSource {
    fn subscribe(&self) -> BoxStream<'static, Option<UserInfo>> {
        let rx = self.tx.subscribe();

        // Yield the current state first, then every change, skipping Pending.
        stream::unfold((rx, true), |(mut rx, first)| async move {
            if !first && rx.changed().await.is_err() {
                return None;
            }
            let state = rx.borrow_and_update().clone();
            Some((state, (rx, false)))
        })
        .filter_map(|state| async move {
            match state {
                AuthState::Pending => None,
                AuthState::SignedOut => Some(None),
                AuthState::SignedIn(user) => Some(Some(user)),
            }
        })
        .boxed()
    }
}

/// Holds the live [`SessionState`] while mounted.
///
/// Dropping the provider unsubscribes from the source.
pub struct SessionProvider {
    state: watch::Receiver<SessionState>,
    task: JoinHandle<()>,
}

impl SessionProvider {
    /// Subscribe to `source` and start tracking auth state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(source: &dyn SessionSource) -> Self {
        let (tx, state) = watch::channel(SessionState::initializing());
        let mut events = source.subscribe();

        let task = tokio::spawn(async move {
            while let Some(user) = events.next().await {
                tracing::debug!(
                    signed_in = user.is_some(),
                    user_id = user.as_ref().map(|u| u.id.as_str()),
                    "Auth state changed"
                );
                // All three fields change together.
                tx.send_replace(SessionState::from_user(user));
            }
        });

        Self { state, task }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Wait for the first auth event and return the resulting state.
    pub async fn initialized(&self) -> SessionState {
        let mut rx = self.state.clone();
        let state = match rx.wait_for(|s| !s.is_initializing).await {
            Ok(state) => state.clone(),
            // Source ended before reporting anything.
            Err(_) => self.current(),
        };
        state
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.task.abort();
    }
}
