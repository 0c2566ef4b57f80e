//! Caller-facing error type
//!
//! Internal code works with `anyhow::Result`. Only the orchestrator converts
//! failures into a [`CallableError`], after logging the full cause, so that
//! provider diagnostics never reach the caller.

use serde::{Deserialize, Serialize};

/// Message returned when no caller identity is present
pub const UNAUTHENTICATED_MESSAGE: &str = "The function must be called while authenticated.";

/// Error kinds surfaced to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No caller identity was present
    Unauthenticated,
    /// The caller omitted a required argument
    InvalidArgument,
    /// Any downstream failure
    Internal,
}

impl ErrorKind {
    /// Canonical lowercase name (`invalid-argument`, ...)
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::InvalidArgument => "invalid-argument",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed failure of the callable operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{status}: {message}")]
pub struct CallableError {
    pub status: ErrorKind,
    pub message: String,
}

impl CallableError {
    pub fn new(status: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthenticated, message)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::Unauthenticated.as_str(), "unauthenticated");
        assert_eq!(ErrorKind::InvalidArgument.as_str(), "invalid-argument");
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }

    #[test]
    fn test_display() {
        let err = CallableError::invalid_argument("Server auth code is required.");
        assert_eq!(err.to_string(), "invalid-argument: Server auth code is required.");
    }

    #[test]
    fn test_wire_format() {
        let err = CallableError::internal("Failed to process emails.");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["status"], "INTERNAL");
        assert_eq!(value["message"], "Failed to process emails.");

        let parsed: CallableError =
            serde_json::from_str(r#"{"status":"INVALID_ARGUMENT","message":"x"}"#).unwrap();
        assert_eq!(parsed.kind(), ErrorKind::InvalidArgument);
    }
}
