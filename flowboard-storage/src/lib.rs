//! FlowBoard storage layer.
//!
//! Two concerns live here: the secure, expiring credential store (the
//! only state that survives a process restart) and the in-memory entity
//! cache with its invalidation protocol.

pub mod cache;
pub mod credential;
pub mod secure_store;

pub use cache::{
    CacheConfig, CacheRead, CacheSnapshot, CacheState, CachedValue, EntityCache, RemoteFetcher,
};
pub use credential::{CredentialRecord, CredentialStore, SaveOptions, SESSION_CREDENTIAL};
pub use secure_store::{EncryptedFileStore, MasterKey, MemorySecureStore, SecureStore};
