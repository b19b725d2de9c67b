//! Sync error types.

use teamsync_core::{StoreError, StoreKind};
use thiserror::Error;

/// Errors that abort a reconciliation run.
///
/// Per-operation failures are never raised as errors; they are recorded as
/// [`crate::report::OperationOutcome`] entries on a successful report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// Identity or mapping record absent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Membership was requested before the member's identity was resolved.
    #[error("Member identity has not been resolved")]
    IdentityNotResolved,

    /// A store could not be reached.
    #[error("{store} store unavailable: {message}")]
    UpstreamUnavailable { store: StoreKind, message: String },

    /// A store refused the credentials or answered with unreadable data.
    #[error("{store} store refused the read: {message}")]
    UpstreamRejected { store: StoreKind, message: String },

    /// Invalid state transition.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl SyncError {
    /// Create a not found error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an upstream unavailable error.
    pub fn upstream(store: StoreKind, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            store,
            message: message.into(),
        }
    }

    /// Create an upstream rejected error.
    pub fn upstream_rejected(store: StoreKind, message: impl Into<String>) -> Self {
        Self::UpstreamRejected {
            store,
            message: message.into(),
        }
    }

    /// Classify a store failure raised while reading state.
    ///
    /// Only transient failures stay retryable. A rejected read means the
    /// store does not know the record asked for.
    #[must_use]
    pub fn from_store(store: StoreKind, error: &StoreError) -> Self {
        match error {
            e if e.is_transient() => Self::upstream(store, e.to_string()),
            StoreError::Rejected { message } => {
                Self::not_found(format!("{store} record"), message)
            }
            e => Self::upstream_rejected(store, e.to_string()),
        }
    }

    /// Create an invalid state transition error.
    pub fn invalid_state_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidStateTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if the caller may retry the whole sync.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::UpstreamUnavailable { .. })
    }

    /// Check if this error ended a run that had already started.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::NotFound { .. }
                | SyncError::IdentityNotResolved
                | SyncError::UpstreamUnavailable { .. }
                | SyncError::UpstreamRejected { .. }
        )
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
