//! Stable error kinds shared by every component, per spec.md §7.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    CredentialsMissing,
    CredentialsInvalid,
    RateLimited,
    Transient,
    NotFound,
    ValidationFailed,
    ApprovalDenied,
    Cancelled,
    Internal,
}

impl ErrorKind {
    /// Whether the invoker (C2) should retry an operation that failed with
    /// this kind, per spec.md §7's propagation column.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transient | ErrorKind::RateLimited)
    }
}

#[derive(Debug, Error)]
#[error("{kind:?} in {operation}: {message}")]
pub struct DriftError {
    pub kind: ErrorKind,
    pub message: String,
    pub operation: String,
}

impl DriftError {
    pub fn new(kind: ErrorKind, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind, operation: operation.into(), message: message.into() }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, operation, "operation was cancelled")
    }

    pub fn internal(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, operation, message)
    }

    pub fn not_found(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, operation, message)
    }
}

impl From<std::io::Error> for DriftError {
    fn from(err: std::io::Error) -> Self {
        DriftError::new(ErrorKind::Internal, "io", err.to_string())
    }
}

impl From<serde_json::Error> for DriftError {
    fn from(err: serde_json::Error) -> Self {
        DriftError::new(ErrorKind::ValidationFailed, "serde_json", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DriftError>;
