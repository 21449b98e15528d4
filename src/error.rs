//! Error types for tool and workflow execution.
//!
//! Execution keeps whatever output was captured before the failure so callers
//! can surface diagnostics alongside the error message.

use thiserror::Error;

/// Failure from a tool or workflow invocation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ExecError {
    /// Human-readable cause.
    pub message: String,
    /// Output captured before the failure, possibly empty.
    pub output: String,
}

impl ExecError {
    pub fn new(message: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            output: output.into(),
        }
    }
}

/// Result type alias for execution paths.
pub type ExecResult = std::result::Result<String, ExecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_message_only() {
        let err = ExecError::new("command execution failed: exit status 1", "partial output");
        assert_eq!(err.to_string(), "command execution failed: exit status 1");
    }

    #[test]
    fn test_output_preserved() {
        let err = ExecError::new("server returned error status: 500", "error body");
        assert_eq!(err.output, "error body");
    }

    #[test]
    fn test_empty_output() {
        let err = ExecError::new("request failed: connection refused", "");
        assert!(err.output.is_empty());
    }
}
