//! The session gate: single writer for the authentication status.
//!
//! Every screen-group decision reads through this object, so the
//! resolved-state invariant is enforced in one place. The gate is
//! fail-closed: an unreadable credential is never trusted.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use flowboard_core::{RemoteError, SessionStatus, SessionUser};
use flowboard_storage::{CredentialStore, SESSION_CREDENTIAL};

const CAROUSEL_FLAG: &str = "hasSeenCarousel";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GateError {
    #[error("Session gate has not been resolved yet")]
    NotResolved,
}

pub struct SessionGate {
    credentials: Arc<CredentialStore>,
    status_tx: watch::Sender<SessionStatus>,
    // True once resolve() has completed; guards every explicit
    // transition and coalesces concurrent resolutions.
    resolved: Mutex<bool>,
}

impl SessionGate {
    pub fn new(credentials: Arc<CredentialStore>) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Unknown);
        Self {
            credentials,
            status_tx,
            resolved: Mutex::new(false),
        }
    }

    /// Current status. `Unknown` until the first `resolve()` completes.
    pub fn status(&self) -> SessionStatus {
        *self.status_tx.borrow()
    }

    /// Watch the status; UI collaborators render neither screen group
    /// while the value is `Unknown`.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    /// Resolve the authentication status from the credential store.
    ///
    /// Concurrent and repeat calls coalesce: the first caller computes
    /// the outcome, everyone else observes it. Any storage error or
    /// unparsable credential settles `Unauthenticated` - never an error
    /// to the caller.
    pub async fn resolve(&self) -> SessionStatus {
        let mut resolved = self.resolved.lock().await;
        if *resolved {
            return self.status();
        }

        let status = match self.credentials.exists(SESSION_CREDENTIAL).await {
            Ok(false) => SessionStatus::Unauthenticated,
            Ok(true) => match self.read_session_user().await {
                Some(user) if !user.token.is_empty() => SessionStatus::Authenticated,
                _ => SessionStatus::Unauthenticated,
            },
            Err(e) => {
                tracing::warn!(error = %e, "credential probe failed, resolving unauthenticated");
                SessionStatus::Unauthenticated
            }
        };

        tracing::info!(?status, "session gate resolved");
        self.status_tx.send_replace(status);
        *resolved = true;
        status
    }

    /// Explicit transition after a completed login or logout. Idempotent.
    ///
    /// # Errors
    /// `GateError::NotResolved` if called before the first `resolve()`.
    pub async fn set_authenticated(&self, authenticated: bool) -> Result<(), GateError> {
        let resolved = self.resolved.lock().await;
        if !*resolved {
            return Err(GateError::NotResolved);
        }
        let status = if authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        };
        self.status_tx.send_replace(status);
        Ok(())
    }

    /// The signed-in user's persisted payload, if a valid one exists.
    pub async fn current_user(&self) -> Option<SessionUser> {
        self.read_session_user().await
    }

    /// Bearer token for an authenticated request.
    ///
    /// Fails fast with `AuthRequired` when no valid credential exists,
    /// so no unauthenticated request ever reaches the network. A missing
    /// credential while the gate believes it is authenticated is a
    /// detected invalidation: the gate degrades to `Unauthenticated`.
    pub async fn bearer_token(&self) -> Result<String, RemoteError> {
        match self.read_session_user().await {
            Some(user) if !user.token.is_empty() => Ok(user.token),
            _ => {
                if self.status() == SessionStatus::Authenticated {
                    tracing::warn!("credential vanished while authenticated, degrading session");
                    self.status_tx.send_replace(SessionStatus::Unauthenticated);
                }
                Err(RemoteError::AuthRequired)
            }
        }
    }

    pub async fn has_seen_carousel(&self) -> bool {
        matches!(
            self.credentials.get_flag(CAROUSEL_FLAG).await,
            Ok(Some(value)) if value == "true"
        )
    }

    pub async fn mark_carousel_seen(&self) -> Result<(), flowboard_core::StorageError> {
        self.credentials.set_flag(CAROUSEL_FLAG, "true").await
    }

    async fn read_session_user(&self) -> Option<SessionUser> {
        let raw = self.credentials.read(SESSION_CREDENTIAL).await?;
        match serde_json::from_str::<SessionUser>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "session payload unparsable, treating as absent");
                None
            }
        }
    }
}
