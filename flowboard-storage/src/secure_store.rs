//! Secure storage primitive and its implementations.
//!
//! `SecureStore` is the boundary the credential store persists through -
//! on device it is backed by the platform keystore; here the default
//! implementation seals values into a single file with XChaCha20-Poly1305
//! under an HKDF-derived key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{Key, KeyInit, XChaCha20Poly1305, XNonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tokio::sync::Mutex;
use zeroize::Zeroize;

use flowboard_core::StorageError;

/// Abstraction over the encrypted key/value primitive.
///
/// All operations are asynchronous and must be awaited to completion
/// before the caller observes their result.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete the value under `key`. Absence is not an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Existence probe that does not decode the stored value.
    async fn contains(&self, key: &str) -> Result<bool, StorageError>;
}

/// 32-byte master key; zeroized when dropped.
pub struct MasterKey([u8; 32]);

impl MasterKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random key.
    pub fn random() -> Self {
        let mut k = [0u8; 32];
        OsRng.fill_bytes(&mut k);
        Self(k)
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedEntry {
    nonce: Vec<u8>,
    ciphertext: Vec<u8>,
}

/// File-backed secure store.
///
/// One JSON document of `key -> {nonce, ciphertext}` entries. Each value
/// is sealed with XChaCha20-Poly1305 under a key derived from the master
/// key via HKDF-SHA256, with the entry key bound as associated data so a
/// ciphertext cannot be replayed under a different name. Writes go to a
/// temporary file and are renamed into place.
pub struct EncryptedFileStore {
    path: PathBuf,
    key: MasterKey,
    // Serializes read-modify-write cycles on the backing file.
    lock: Mutex<()>,
}

const SEAL_INFO: &[u8] = b"flowboard-credential-seal-v1";

impl EncryptedFileStore {
    pub fn open(path: impl AsRef<Path>, key: MasterKey) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            key,
            lock: Mutex::new(()),
        }
    }

    fn sealing_key(&self) -> Result<[u8; 32], StorageError> {
        let hk = Hkdf::<Sha256>::new(None, &self.key.0);
        let mut okm = [0u8; 32];
        hk.expand(SEAL_INFO, &mut okm)
            .map_err(|e| StorageError::Crypto {
                reason: format!("hkdf expand failed: {e:?}"),
            })?;
        Ok(okm)
    }

    fn aead(&self) -> Result<XChaCha20Poly1305, StorageError> {
        let mut seal_key = self.sealing_key()?;
        let aead = XChaCha20Poly1305::new(Key::from_slice(&seal_key));
        seal_key.zeroize();
        Ok(aead)
    }

    fn seal(&self, key: &str, value: &str) -> Result<SealedEntry, StorageError> {
        let mut nonce = [0u8; 24];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self
            .aead()?
            .encrypt(
                XNonce::from_slice(&nonce),
                Payload {
                    msg: value.as_bytes(),
                    aad: key.as_bytes(),
                },
            )
            .map_err(|e| StorageError::Crypto {
                reason: format!("encryption failed: {e:?}"),
            })?;
        Ok(SealedEntry {
            nonce: nonce.to_vec(),
            ciphertext,
        })
    }

    fn unseal(&self, key: &str, entry: &SealedEntry) -> Result<String, StorageError> {
        if entry.nonce.len() != 24 {
            return Err(StorageError::Crypto {
                reason: format!("invalid nonce length: {}", entry.nonce.len()),
            });
        }
        let plain = self
            .aead()?
            .decrypt(
                XNonce::from_slice(&entry.nonce),
                Payload {
                    msg: entry.ciphertext.as_slice(),
                    aad: key.as_bytes(),
                },
            )
            .map_err(|_| StorageError::Crypto {
                reason: "decryption failed".to_string(),
            })?;
        String::from_utf8(plain).map_err(|_| StorageError::Crypto {
            reason: "decrypted value is not UTF-8".to_string(),
        })
    }

    async fn load(&self) -> Result<HashMap<String, SealedEntry>, StorageError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StorageError::Serde {
                reason: format!("store file corrupt: {e}"),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(StorageError::Io {
                reason: e.to_string(),
            }),
        }
    }

    async fn persist(&self, entries: &HashMap<String, SealedEntry>) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(entries).map_err(|e| StorageError::Serde {
            reason: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Io {
                    reason: e.to_string(),
                })?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::WriteFailed {
                reason: e.to_string(),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StorageError::WriteFailed {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl SecureStore for EncryptedFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        match entries.get(key) {
            Some(entry) => self.unseal(key, entry).map(Some),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await.unwrap_or_default();
        entries.insert(key.to_string(), self.seal(key, value)?);
        self.persist(&entries).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await.unwrap_or_default();
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        let _guard = self.lock.lock().await;
        let entries = self.load().await?;
        Ok(entries.contains_key(key))
    }
}

/// In-memory secure store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySecureStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySecureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SecureStore for MemorySecureStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.lock().await.contains_key(key))
    }
}
