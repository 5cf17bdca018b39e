//! Error types for the SCM client boundary.

use thiserror::Error;

/// Errors surfaced by an [`crate::ScmClient`] implementation or by facade
/// acquisition.
///
/// The core maps these onto its own taxonomy; the distinction that matters
/// here is `NotFound` (the server no longer knows the object) versus
/// transport-level failures (`Connection`, `Timeout`).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The referenced server object does not exist (any more).
    #[error("{kind} \"{name}\" not found on the repository server")]
    NotFound { kind: String, name: String },

    /// The repository server could not be reached or dropped the call.
    #[error("connection to the repository server failed: {0}")]
    Connection(String),

    /// A client-side deadline elapsed before the server answered.
    #[error("{op} timed out after {millis} ms")]
    Timeout { op: String, millis: u64 },

    /// A toolkit version string could not be parsed.
    #[error("invalid toolkit version \"{0}\"")]
    InvalidVersion(String),

    /// The connected toolkit cannot perform the requested operation.
    #[error("operation not supported by the connected toolkit: {0}")]
    Unsupported(String),
}

impl ClientError {
    /// Convenience constructor for the common not-found case.
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        ClientError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_object() {
        let err = ClientError::not_found("repository workspace", "Dev Workspace");
        let msg = err.to_string();
        assert!(msg.contains("repository workspace"));
        assert!(msg.contains("Dev Workspace"));
        assert!(msg.contains("not found"));
    }

    #[test]
    fn timeout_reports_op_and_millis() {
        let err = ClientError::Timeout {
            op: "accept".to_string(),
            millis: 1500,
        };
        assert!(err.to_string().contains("accept"));
        assert!(err.to_string().contains("1500"));
    }
}
