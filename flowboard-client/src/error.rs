//! Error types for the client layer.

use crate::config::ConfigError;
use crate::mutation::MutationError;
use crate::session::GateError;
use flowboard_core::{CacheError, RemoteError, StorageError, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}
