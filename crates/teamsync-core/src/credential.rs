//! Credentials threaded through every outbound store call.
//!
//! There is no process-wide "current session". A caller builds one
//! [`CallContext`] per sync run and every store method receives the
//! credential for its side explicitly, so concurrent runs for different
//! members cannot observe each other's authentication state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::IdentityKind;

/// Credential presented to one external store.
///
/// The [`Debug`] impl redacts the token to keep it out of log output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Bearer token sent in the `Authorization` header.
    Bearer { token: String },
    /// No authentication (local fixtures and tests).
    Anonymous,
}

impl Credential {
    /// Bearer credential from a token.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: token.into(),
        }
    }

    /// Token to present, if any.
    #[must_use]
    pub fn bearer_token(&self) -> Option<&str> {
        match self {
            Self::Bearer { token } => Some(token),
            Self::Anonymous => None,
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer { .. } => f
                .debug_struct("Bearer")
                .field("token", &"[REDACTED]")
                .finish(),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Per-run call context.
#[derive(Debug, Clone)]
pub struct CallContext {
    directory: Credential,
    platform: Credential,
    request_id: Uuid,
}

impl CallContext {
    /// Create a context with one credential per store.
    #[must_use]
    pub fn new(directory: Credential, platform: Credential) -> Self {
        Self {
            directory,
            platform,
            request_id: Uuid::new_v4(),
        }
    }

    /// Context without credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Credential::Anonymous, Credential::Anonymous)
    }

    /// Override the request ID (used for log correlation).
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Credential for the directory store.
    #[must_use]
    pub fn directory(&self) -> &Credential {
        &self.directory
    }

    /// Credential for the platform store.
    #[must_use]
    pub fn platform(&self) -> &Credential {
        &self.platform
    }

    /// Credential for the given side.
    #[must_use]
    pub fn credential_for(&self, side: IdentityKind) -> &Credential {
        match side {
            IdentityKind::Directory => &self.directory,
            IdentityKind::Platform => &self.platform,
        }
    }

    /// Correlation ID for this run.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}
