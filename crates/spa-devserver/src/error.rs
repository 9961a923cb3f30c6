//! Error types for the development server launcher.
//!
//! Startup can fail in three distinct ways that callers need to tell apart:
//! the child never started, the child started but its output closed before it
//! announced readiness, or nothing signalled readiness within the budget.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Cause recorded when an output stream ends before the server reports readiness.
pub const STREAM_FAILURE_CAUSE: &str = "the development-server command failed to start";

/// Main error type for the development server launcher.
#[derive(Debug, Error)]
pub enum DevServerError {
    #[error("Failed to launch `{program}` in {working_dir:?}: {message}")]
    LaunchFailed {
        program: String,
        working_dir: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Development server stream failed: {cause}")]
    StreamFailed { cause: String },

    #[error("Development server did not become ready within {0:?}")]
    Timeout(Duration),

    #[error("Configuration error for {field}: {message}")]
    Config { field: String, message: String },
}

/// Result type alias for launcher operations.
pub type Result<T> = std::result::Result<T, DevServerError>;

/// Coarse classification of a startup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The child process could not be created.
    Launch,
    /// The child's output closed or errored before readiness.
    Stream,
    /// Readiness was not observed within the budget.
    Timeout,
    /// Invalid configuration, detected before anything is launched.
    Other,
}

impl DevServerError {
    /// Build a launch failure from the spawn error.
    pub fn launch(
        program: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        err: std::io::Error,
    ) -> Self {
        DevServerError::LaunchFailed {
            program: program.into(),
            working_dir: working_dir.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Build a configuration error for a single field.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        DevServerError::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            DevServerError::LaunchFailed { .. } => FailureKind::Launch,
            DevServerError::StreamFailed { .. } => FailureKind::Stream,
            DevServerError::Timeout(_) => FailureKind::Timeout,
            DevServerError::Config { .. } => FailureKind::Other,
        }
    }

    /// Check if calling `resolve` again may succeed.
    ///
    /// A timed-out child is left running, so a later call can still pick it
    /// up through the listening-port check.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DevServerError::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DevServerError::Timeout(Duration::from_secs(60));
        assert_eq!(
            err.to_string(),
            "Development server did not become ready within 60s"
        );

        let err = DevServerError::StreamFailed {
            cause: STREAM_FAILURE_CAUSE.to_string(),
        };
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn test_failure_kinds() {
        let launch = DevServerError::launch(
            "npm",
            "ClientApp",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(launch.kind(), FailureKind::Launch);
        assert_eq!(
            DevServerError::StreamFailed {
                cause: "closed".into()
            }
            .kind(),
            FailureKind::Stream
        );
        assert_eq!(
            DevServerError::Timeout(Duration::from_millis(200)).kind(),
            FailureKind::Timeout
        );
        assert_eq!(
            DevServerError::config("port", "must not be 0").kind(),
            FailureKind::Other
        );
    }

    #[test]
    fn test_launch_error_keeps_source() {
        use std::error::Error as _;

        let err = DevServerError::launch(
            "npm",
            "ClientApp",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.source().is_some());
        assert!(err.to_string().contains("npm"));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(DevServerError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(!DevServerError::StreamFailed {
            cause: "closed".into()
        }
        .is_retryable());
    }
}
