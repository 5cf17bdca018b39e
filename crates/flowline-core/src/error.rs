//! Error taxonomy for the flowline core.
//!
//! Four failure families with distinct handling at the host:
//! fail the build (`MalformedReport`, `Configuration`, `Capability`), fail
//! the poll (`NotFound`, `Timeout`), or bubble a transport fault (`Client`).
//! Messages are stable; callers assert on them.

use flowline_scm::{ClientError, ToolkitVersion};

/// Errors produced by parsing, load resolution, polling, and checkout.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The change report envelope cannot be parsed. Fatal to the current
    /// operation, never retried here.
    #[error("malformed change report: {0}")]
    MalformedReport(String),

    /// Invalid or contradictory configuration. The message is surfaced
    /// verbatim, never silently corrected.
    #[error("{0}")]
    Configuration(String),

    /// Requested feature unsupported by the connected toolkit version.
    #[error("{feature} requires build toolkit version {minimum} or later; the connected toolkit is {actual}")]
    Capability {
        feature: String,
        minimum: ToolkitVersion,
        actual: ToolkitVersion,
    },

    /// The object the operation must act on no longer exists on the server.
    #[error("{kind} \"{name}\" not found on the repository server")]
    NotFound { kind: String, name: String },

    /// A client call did not complete within the caller-supplied deadline.
    /// Never degraded to a "no changes" poll answer.
    #[error("{op} did not complete within {millis} ms")]
    Timeout { op: String, millis: u64 },

    /// Any other repository client failure.
    #[error("repository client error: {0}")]
    Client(ClientError),
}

impl CoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        CoreError::Configuration(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        CoreError::MalformedReport(msg.into())
    }
}

// Client NotFound/Timeout keep their taxon across the boundary so the host
// can tell "fail the build" from "fail the poll".
impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound { kind, name } => CoreError::NotFound { kind, name },
            ClientError::Timeout { op, millis } => CoreError::Timeout { op, millis },
            other => CoreError::Client(other),
        }
    }
}

/// Result type for flowline core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
