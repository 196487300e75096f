//! services/client/src/error.rs
//!
//! Defines the primary error type for the client service.

use crate::config::ConfigError;
use orbit_core::ports::PortError;

/// The primary error type for the `client` service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("{}", .0.user_message())]
    Port(#[from] PortError),

    /// Represents a standard Input/Output error (e.g., reading a resume from disk).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Represents a malformed JSON document supplied by the user.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
