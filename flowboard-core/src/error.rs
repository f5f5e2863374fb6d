//! Error types for FlowBoard client operations

use thiserror::Error;

/// Credential storage errors.
///
/// These never escalate to a crash: callers degrade to the logged-out
/// state instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Secure storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Write to secure storage failed: {reason}")]
    WriteFailed { reason: String },

    #[error("Crypto failure: {reason}")]
    Crypto { reason: String },

    #[error("Storage IO failure: {reason}")]
    Io { reason: String },

    #[error("Record serialization failed: {reason}")]
    Serde { reason: String },
}

/// Remote API errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// No valid bearer token was available; the request was never sent.
    #[error("Authentication required")]
    AuthRequired,

    /// The server answered with `success: false`.
    #[error("{message}")]
    Server { message: String },

    #[error("Transport failure: {reason}")]
    Transport { reason: String },

    #[error("Response decoding failed: {reason}")]
    Decode { reason: String },

    #[error("Request timed out")]
    Timeout,
}

/// Input validation errors, surfaced before any network call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Entity cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Fetch failed: {detail}")]
    FetchFailed { detail: String },

    #[error("Fetch retries exhausted: {detail}")]
    RetriesExhausted { detail: String },

    /// The in-flight fetch was abandoned by every attached caller.
    #[error("Fetch cancelled")]
    Cancelled,
}

/// Umbrella error for callers that span layers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowboardError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result alias for FlowBoard client operations.
pub type FlowboardResult<T> = Result<T, FlowboardError>;
