//! Store error types
//!
//! Errors raised by directory and platform store implementations, classified
//! so the engine can tell an unreachable store from a rejected mutation and a
//! mutation that was already in effect.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which external store an error or operation concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Organizational directory.
    Directory,
    /// Chat platform.
    Platform,
}

impl StoreKind {
    /// Convert to string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Directory => "directory",
            StoreKind::Platform => "platform",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned by a store call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    // Reachability (transient)
    /// The store could not be reached or answered with a server error.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// The call did not complete in time.
    #[error("store call timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    // Permanent
    /// The credential was refused.
    #[error("store refused credentials: {message}")]
    Unauthorized { message: String },

    /// The store rejected the request.
    #[error("store rejected request: {message}")]
    Rejected { message: String },

    /// The store answered with something that could not be decoded.
    #[error("invalid data from store: {message}")]
    InvalidData { message: String },

    // Idempotent no-ops
    /// The membership being added already exists.
    #[error("membership already present")]
    AlreadyPresent,

    /// The membership being removed does not exist.
    #[error("membership already absent")]
    AlreadyAbsent,
}

impl StoreError {
    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a rejected error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Check if this error is transient and the call may succeed if repeated.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable { .. } | StoreError::Timeout { .. }
        )
    }

    /// Check if this error means the requested state already holds.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        matches!(self, StoreError::AlreadyPresent | StoreError::AlreadyAbsent)
    }

    /// Get a short error code for logs and reports.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::Unavailable { .. } => "UNAVAILABLE",
            StoreError::Timeout { .. } => "TIMEOUT",
            StoreError::Unauthorized { .. } => "UNAUTHORIZED",
            StoreError::Rejected { .. } => "REJECTED",
            StoreError::InvalidData { .. } => "INVALID_DATA",
            StoreError::AlreadyPresent => "ALREADY_PRESENT",
            StoreError::AlreadyAbsent => "ALREADY_ABSENT",
        }
    }
}

/// Result type for store calls.
pub type StoreResult<T> = Result<T, StoreError>;
