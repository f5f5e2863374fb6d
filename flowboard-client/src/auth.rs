//! Authentication flows: login, registration, logout, account removal.
//!
//! The credential written here is the only state that survives a process
//! restart. A save that fails aborts the login - the user is not logged
//! in until the credential is durably stored.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::ClientError;
use crate::rest::RestClient;
use crate::session::SessionGate;
use crate::types::{ForgotPasswordInput, LoginInput, RegisterInput};
use flowboard_core::{SessionUser, StorageError, UserProfile};
use flowboard_storage::{CredentialStore, SaveOptions, SESSION_CREDENTIAL};

/// Sessions are long-lived; the server invalidates tokens on its side.
const SESSION_TTL_DAYS: i64 = 365;

pub struct AuthService {
    rest: Arc<RestClient>,
    credentials: Arc<CredentialStore>,
    gate: Arc<SessionGate>,
}

impl AuthService {
    pub fn new(
        rest: Arc<RestClient>,
        credentials: Arc<CredentialStore>,
        gate: Arc<SessionGate>,
    ) -> Self {
        Self {
            rest,
            credentials,
            gate,
        }
    }

    /// Register a new account. No credential is persisted; the product
    /// routes the user to the login screen afterwards.
    pub async fn register(&self, input: RegisterInput) -> Result<String, ClientError> {
        input.validate()?;
        let message = self.rest.register(&input).await?;
        tracing::info!(email = %input.email, "account registered");
        Ok(message)
    }

    /// Log in and persist the session credential.
    pub async fn login(&self, input: LoginInput) -> Result<UserProfile, ClientError> {
        input.validate()?;
        let (token, user) = self.rest.login(&input).await?;
        if token.is_empty() {
            return Err(ClientError::Remote(flowboard_core::RemoteError::Decode {
                reason: "empty token in login response".to_string(),
            }));
        }

        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);
        let session = SessionUser {
            token,
            user_id: user.id,
            email: user.email,
            firstname: user.firstname,
            expires_at: Some(expires_at),
        };
        let payload = serde_json::to_string(&session).map_err(|e| {
            ClientError::Storage(StorageError::Serde {
                reason: e.to_string(),
            })
        })?;

        self.credentials
            .save(
                SESSION_CREDENTIAL,
                payload,
                SaveOptions {
                    expires_at: Some(expires_at),
                    secure: true,
                },
            )
            .await?;

        self.gate.set_authenticated(true).await?;
        tracing::info!(email = %session.email, "login complete");
        Ok(session.profile())
    }

    pub async fn forgot_password(&self, input: ForgotPasswordInput) -> Result<String, ClientError> {
        input.validate()?;
        let message = self.rest.forgot_password(&input).await?;
        Ok(message)
    }

    /// Log out. Idempotent: an already-absent credential is success.
    pub async fn logout(&self) -> Result<(), ClientError> {
        match self.credentials.exists(SESSION_CREDENTIAL).await {
            Ok(false) => {
                tracing::debug!("no session credential found, already logged out");
            }
            Ok(true) => {
                self.credentials.remove(SESSION_CREDENTIAL).await?;
            }
            Err(e) => {
                // Fail-closed: still flip the gate, the credential is
                // unreadable anyway.
                tracing::warn!(error = %e, "credential probe failed during logout");
            }
        }
        self.gate.set_authenticated(false).await?;
        Ok(())
    }

    /// Delete the account on the server, then clear local session state.
    pub async fn delete_account(&self) -> Result<String, ClientError> {
        let message = self.rest.delete_user().await?;
        self.logout().await?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowboard_core::ValidationError;

    #[test]
    fn test_register_input_rejects_weak_password() {
        let input = RegisterInput {
            firstname: "Ada".into(),
            lastname: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "short".into(),
        };
        assert!(matches!(
            input.validate(),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_login_input_rejects_missing_email() {
        let input = LoginInput {
            email: String::new(),
            password: "Str0ng!pass".into(),
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::missing_field("email"))
        );
    }
}
