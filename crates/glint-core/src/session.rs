//! Shared session state and its broadcast to interested views.
//!
//! The session starts in a loading state while restoration runs; consumers
//! that gate on sign-in wait for `loading` to clear before deciding.

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::identity::{AuthUser, IdentityClient, cache};

/// Current authentication state, as observed by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<AuthUser>,
    /// True until session restoration has finished (success or not).
    pub loading: bool,
}

impl Session {
    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Owns the session and notifies subscribers on every change.
pub struct SessionManager {
    tx: watch::Sender<Session>,
}

impl SessionManager {
    /// Creates a manager in the loading state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Session {
            user: None,
            loading: true,
        });
        Self { tx }
    }

    /// Subscribes to session changes. The receiver sees the current value
    /// immediately and every update after it.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Installs a signed-in user and persists it for restoration.
    pub fn set_user(&self, user: AuthUser) {
        if let Err(err) = cache::save(&user) {
            warn!("failed to persist session: {err:#}");
        }
        self.tx.send_replace(Session {
            user: Some(user),
            loading: false,
        });
    }

    /// Clears the session and the on-disk cache.
    pub fn sign_out(&self) -> Result<()> {
        cache::clear()?;
        self.tx.send_replace(Session {
            user: None,
            loading: false,
        });
        Ok(())
    }

    /// Marks restoration finished without a user.
    pub fn resolve_anonymous(&self) {
        self.tx.send_replace(Session {
            user: None,
            loading: false,
        });
    }

    /// Attempts to restore a previous session from the cache.
    ///
    /// A cached token that is still fresh is used as-is; an expired one is
    /// refreshed through the identity provider. Any failure resolves to the
    /// anonymous state rather than an error: restoration is best-effort.
    pub async fn restore(&self, client: &IdentityClient) {
        let cached = match cache::load() {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.resolve_anonymous();
                return;
            }
            Err(err) => {
                debug!("session cache unreadable: {err:#}");
                self.resolve_anonymous();
                return;
            }
        };

        if !cached.is_expired() {
            self.tx.send_replace(Session {
                user: Some(cached),
                loading: false,
            });
            return;
        }

        match client.refresh_id_token(&cached.refresh_token).await {
            Ok(mut refreshed) => {
                // The refresh reply has no email; keep the cached one.
                if refreshed.email.is_none() {
                    refreshed.email = cached.email;
                }
                self.set_user(refreshed);
            }
            Err(err) => {
                debug!("session refresh failed: {err:#}");
                let _ = cache::clear();
                self.resolve_anonymous();
            }
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
