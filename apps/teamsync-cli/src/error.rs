//! CLI error types and exit codes

use teamsync_reconcile::SyncError;
use thiserror::Error;

use crate::config::ConfigError;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Sync finished but some operations failed
/// - 3: A store was unreachable
/// - 4: Member or mapping not found
/// - 5: Invalid input or configuration
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream unavailable: {0}")]
    Upstream(String),

    #[error("Upstream refused: {0}")]
    Refused(String),

    #[error("{failed} operation(s) failed")]
    PartialFailure { failed: usize },

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Sync error: {0}")]
    Sync(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::PartialFailure { .. } => 2,
            CliError::Upstream(_) => 3,
            CliError::NotFound(_) => 4,
            CliError::InvalidInput(_) | CliError::Config(_) => 5,
            CliError::Refused(_) | CliError::Fixture(_) | CliError::Io(_) | CliError::Sync(_) => 1,
        }
    }

    /// Print the error to stderr
    pub fn print(&self) {
        if std::env::var("NO_COLOR").is_err() {
            eprintln!("\x1b[31mError:\x1b[0m {self}");
        } else {
            eprintln!("Error: {self}");
        }
        if let Some(suggestion) = self.suggestion() {
            eprintln!("\nSuggestion: {suggestion}");
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Config(ConfigError::MissingVar(_)) => {
                Some("Set the store URLs in the environment or a .env file, or pass --fixture.")
            }
            CliError::Upstream(_) => Some("Check that both stores are reachable and try again."),
            CliError::Refused(_) => {
                Some("Check the store tokens and URLs; retrying will not help.")
            }
            _ => None,
        }
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        match &e {
            SyncError::NotFound { .. } | SyncError::IdentityNotResolved => {
                CliError::NotFound(e.to_string())
            }
            SyncError::UpstreamUnavailable { .. } => CliError::Upstream(e.to_string()),
            SyncError::UpstreamRejected { .. } => CliError::Refused(e.to_string()),
            SyncError::Configuration { message } => {
                CliError::Config(ConfigError::InvalidValue("sync".into(), message.clone()))
            }
            SyncError::InvalidStateTransition { .. } => CliError::Sync(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {e}"))
    }
}
