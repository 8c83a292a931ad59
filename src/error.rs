//! Error types and failure classification for the adapter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::service::ServiceError;

/// Classified failure kinds, as rendered in the call envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Startup configuration is missing or invalid.
    Configuration,
    /// No tool with the requested name exists.
    NotFound,
    /// Arguments failed schema validation.
    Validation,
    /// The remote service responded with a failure status.
    Upstream,
    /// No response reached the remote service.
    Transport,
    /// A poll deadline elapsed before the remote work completed.
    Timeout,
    /// Anything else.
    Internal,
}

/// Errors produced while running a tool.
///
/// Every variant renders to the exact message the caller sees; the
/// dispatcher converts these into `Failure{kind, message}` results and
/// never lets one escape its boundary.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Unknown tool name
    #[error("Unknown tool: {0}")]
    NotFound(String),

    /// Arguments failed validation; the message lists every violation.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The remote service call failed (HTTP status or transport).
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// A poll session exhausted its deadline.
    #[error("Timed out waiting for report {hash} after {timeout_ms} ms")]
    Timeout { hash: String, timeout_ms: u64 },

    /// Generic failure with its message text.
    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    /// Classifies this error into its envelope kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::NotFound(_) => ErrorKind::NotFound,
            ToolError::InvalidArguments(_) => ErrorKind::Validation,
            ToolError::Service(ServiceError::Status { .. }) => ErrorKind::Upstream,
            ToolError::Service(ServiceError::Transport(_)) => ErrorKind::Transport,
            ToolError::Timeout { .. } => ErrorKind::Timeout,
            ToolError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Remote HTTP status, when this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ToolError::Service(ServiceError::Status { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
