//! Pending status and remote operation names.
//!
//! A pending status records a local intent that has not reached the remote
//! resource yet. Its absence (`None`) means the entity is settled.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// An uncommitted local mutation attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    /// Created locally, never seen by the remote
    Create,
    /// Changed locally since the last flush
    Update,
    /// Removed locally; kept until the remote confirms deletion
    Destroy,
}

impl PendingStatus {
    /// Wire name used in the annotated local representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Create => "create",
            PendingStatus::Update => "update",
            PendingStatus::Destroy => "destroy",
        }
    }

    /// The remote operation that flushes this status.
    pub fn remote_op(&self) -> RemoteOp {
        match self {
            PendingStatus::Create => RemoteOp::Create,
            PendingStatus::Update => RemoteOp::Update,
            PendingStatus::Destroy => RemoteOp::Destroy,
        }
    }

    /// Status after a local update of an entity currently in `current`.
    ///
    /// An unflushed creation stays a creation.
    pub fn after_update(current: Option<PendingStatus>) -> PendingStatus {
        match current {
            Some(PendingStatus::Create) => PendingStatus::Create,
            _ => PendingStatus::Update,
        }
    }

    /// Status after a local destroy of an entity currently in `current`.
    ///
    /// Returns `None` when the entity should simply disappear.
    pub fn after_destroy(current: Option<PendingStatus>) -> Option<PendingStatus> {
        match current {
            Some(PendingStatus::Create) => None,
            _ => Some(PendingStatus::Destroy),
        }
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(PendingStatus::Create),
            "update" => Ok(PendingStatus::Update),
            "destroy" => Ok(PendingStatus::Destroy),
            other => Err(Error::InvalidStatus(other.to_string())),
        }
    }
}

/// Operations a remote resource may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteOp {
    List,
    Load,
    Get,
    Create,
    Update,
    Destroy,
}

impl RemoteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteOp::List => "list",
            RemoteOp::Load => "load",
            RemoteOp::Get => "get",
            RemoteOp::Create => "create",
            RemoteOp::Update => "update",
            RemoteOp::Destroy => "destroy",
        }
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
