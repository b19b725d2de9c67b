//! Environment configuration for the CLI.
//!
//! | Variable | Default |
//! |---|---|
//! | `TEAMSYNC_DIRECTORY_URL` | required unless `--fixture` |
//! | `TEAMSYNC_PLATFORM_URL` | required unless `--fixture` |
//! | `TEAMSYNC_DIRECTORY_TOKEN` | none (anonymous) |
//! | `TEAMSYNC_PLATFORM_TOKEN` | none (anonymous) |
//! | `TEAMSYNC_MERGE_POLICY` | `union` |
//! | `TEAMSYNC_TIMEOUT_SECS` | `10` |
//! | `TEAMSYNC_MAX_RETRIES` | `2` |
//! | `TEAMSYNC_MAX_CONCURRENCY` | `4` |

use std::time::Duration;

use teamsync_connector_rest::{RestStoreConfig, RetryPolicy};
use teamsync_core::{CallContext, Credential};
use teamsync_reconcile::MergePolicy;

/// CLI configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub directory_url: Option<String>,
    pub platform_url: Option<String>,
    pub directory_token: Option<String>,
    pub platform_token: Option<String>,
    pub merge_policy: MergePolicy,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub max_concurrency: usize,
}

impl CliConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration using a custom reader function.
    ///
    /// This allows testing without mutating global
    /// environment state.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let optional = |key: &str| {
            reader(key)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let merge_policy = match optional("TEAMSYNC_MERGE_POLICY") {
            Some(raw) => raw
                .parse()
                .map_err(|e: String| ConfigError::InvalidValue("TEAMSYNC_MERGE_POLICY".into(), e))?,
            None => MergePolicy::default(),
        };

        let timeout_secs: u64 = parse_or(&optional, "TEAMSYNC_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "TEAMSYNC_TIMEOUT_SECS".into(),
                "must be greater than zero".into(),
            ));
        }

        Ok(Self {
            directory_url: optional("TEAMSYNC_DIRECTORY_URL"),
            platform_url: optional("TEAMSYNC_PLATFORM_URL"),
            directory_token: optional("TEAMSYNC_DIRECTORY_TOKEN"),
            platform_token: optional("TEAMSYNC_PLATFORM_TOKEN"),
            merge_policy,
            timeout_secs,
            max_retries: parse_or(&optional, "TEAMSYNC_MAX_RETRIES", 2)?,
            max_concurrency: parse_or(&optional, "TEAMSYNC_MAX_CONCURRENCY", 4)?,
        })
    }

    /// Per-run credentials for both stores.
    pub fn call_context(&self) -> CallContext {
        CallContext::new(
            credential(self.directory_token.as_deref()),
            credential(self.platform_token.as_deref()),
        )
    }

    /// REST settings for the directory store.
    pub fn directory_store(&self) -> Result<RestStoreConfig, ConfigError> {
        self.store_config("TEAMSYNC_DIRECTORY_URL", self.directory_url.as_deref())
    }

    /// REST settings for the platform store.
    pub fn platform_store(&self) -> Result<RestStoreConfig, ConfigError> {
        self.store_config("TEAMSYNC_PLATFORM_URL", self.platform_url.as_deref())
    }

    fn store_config(&self, var: &str, url: Option<&str>) -> Result<RestStoreConfig, ConfigError> {
        let url = url.ok_or_else(|| ConfigError::MissingVar(var.into()))?;
        let config = RestStoreConfig::new(url)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            });
        config
            .validate()
            .map_err(|e| ConfigError::InvalidValue(var.into(), e))?;
        Ok(config)
    }
}

fn credential(token: Option<&str>) -> Credential {
    token.map_or(Credential::Anonymous, Credential::bearer)
}

fn parse_or<T, F>(optional: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match optional(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.into(), e.to_string())),
        None => Ok(default),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
