//! Expiring credential persistence.
//!
//! Exactly one logical credential (`"session"`) lives here in practice.
//! Records are replaced wholesale, never mutated in place, and a record
//! whose expiry has passed is treated as absent: `read` deletes it as a
//! side effect, `exists` deliberately does not (cheap fast path).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::secure_store::SecureStore;
use flowboard_core::{StorageError, Timestamp};

/// Logical name of the single authenticated-session credential.
pub const SESSION_CREDENTIAL: &str = "session";

const KEY_PREFIX: &str = "cookie-";

/// Persisted credential envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub value: String,
    pub created_at: Timestamp,
    pub expires_at: Option<Timestamp>,
    pub secure: bool,
}

impl CredentialRecord {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(expires) if expires < now)
    }
}

/// Options for `CredentialStore::save`.
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub expires_at: Option<Timestamp>,
    pub secure: bool,
}

/// The credential store owns the secure storage primitive exclusively;
/// no other component touches it directly. Operations on a name are
/// serialized so a read never observes a torn write.
pub struct CredentialStore {
    store: Box<dyn SecureStore>,
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(store: impl SecureStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            lock: Mutex::new(()),
        }
    }

    fn record_key(name: &str) -> String {
        format!("{KEY_PREFIX}{name}")
    }

    /// Persist a credential, replacing any previous record under `name`.
    ///
    /// A failed save must not be treated as logged-in by the caller.
    pub async fn save(
        &self,
        name: &str,
        value: impl Into<String>,
        options: SaveOptions,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        if !options.secure {
            tracing::warn!(name, "saving credential without the secure flag");
        }
        let record = CredentialRecord {
            value: value.into(),
            created_at: Utc::now(),
            expires_at: options.expires_at,
            secure: options.secure,
        };
        let serialized = serde_json::to_string(&record).map_err(|e| StorageError::Serde {
            reason: e.to_string(),
        })?;
        self.store.set(&Self::record_key(name), &serialized).await
    }

    /// Read the credential value under `name`.
    ///
    /// Returns `None` when absent, expired (deleting the record as a
    /// side effect), or undeserializable - a corrupt record is treated
    /// as absent, never as a fatal error.
    pub async fn read(&self, name: &str) -> Option<String> {
        let _guard = self.lock.lock().await;
        let key = Self::record_key(name);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(name, error = %e, "credential read failed");
                return None;
            }
        };
        let record: CredentialRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(name, error = %e, "credential record corrupt, treating as absent");
                return None;
            }
        };
        if record.is_expired(Utc::now()) {
            tracing::debug!(name, "credential expired, deleting lazily");
            if let Err(e) = self.store.delete(&key).await {
                tracing::warn!(name, error = %e, "failed to delete expired credential");
            }
            return None;
        }
        Some(record.value)
    }

    /// Idempotent delete; absence is not an error.
    pub async fn remove(&self, name: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        self.store.delete(&Self::record_key(name)).await
    }

    /// Existence probe without deserializing the payload. Does not
    /// trigger lazy expiry - only `read` does.
    pub async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        self.store.contains(&Self::record_key(name)).await
    }

    /// Read a plain (non-credential, non-expiring) flag.
    pub async fn get_flag(&self, name: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        self.store.get(name).await
    }

    /// Store a plain flag.
    pub async fn set_flag(&self, name: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        self.store.set(name, value).await
    }
}
