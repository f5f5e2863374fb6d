//! FlowBoard client library exports.

pub mod auth;
pub mod config;
pub mod error;
pub mod mutation;
pub mod rest;
pub mod session;
pub mod types;
pub mod validation;

pub use auth::AuthService;
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use mutation::{MutationCoordinator, MutationError, MutationPhase};
pub use rest::RestClient;
pub use session::{GateError, SessionGate};
