//! # Tether Client
//!
//! Concrete collaborators for `tether-engine`:
//!
//! - [`HttpRemote`] - a remote resource over a JSON REST endpoint
//! - [`FileStorage`] - local values kept as JSON files in a directory
//! - [`Config`] - environment configuration for the sync agent

pub mod config;
pub mod error;
pub mod remote;
pub mod storage;

pub use config::{Config, ConfigError};
pub use error::{ClientError, Result};
pub use remote::HttpRemote;
pub use storage::FileStorage;
