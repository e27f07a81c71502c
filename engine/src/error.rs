//! Error types for the Tether engine.

use crate::{RemoteOp, ResourceShape};
use thiserror::Error;

/// All possible errors from the Tether engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Decoding errors
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    #[error("invalid pending status: {0}")]
    InvalidStatus(String),

    #[error("invalid resource shape: {0}")]
    InvalidShape(String),

    // Dispatch errors
    #[error("remote does not support {0}")]
    Unsupported(RemoteOp),

    #[error("{op} is not available on a {shape} resource")]
    NotApplicable {
        op: &'static str,
        shape: ResourceShape,
    },

    // Collaborator errors
    #[error("remote {op} failed: {message}")]
    Remote { op: RemoteOp, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Build a remote failure for `op`.
    pub fn remote(op: RemoteOp, message: impl Into<String>) -> Self {
        Error::Remote {
            op,
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
