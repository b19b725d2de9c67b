//! REST store configuration

use reqwest::Url;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for one REST store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestStoreConfig {
    /// Base URL; endpoint paths are appended to it.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl RestStoreConfig {
    /// Create a configuration with the default timeout and retry policy.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Parse the base URL, rejecting anything that cannot carry an
    /// HTTP(S) endpoint path.
    pub fn parse_base_url(&self) -> Result<Url, String> {
        let trimmed = self.base_url.trim();
        if trimmed.is_empty() {
            return Err("base URL is required".to_string());
        }

        let url = Url::parse(trimmed).map_err(|e| format!("invalid base URL '{trimmed}': {e}"))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("unsupported URL scheme: {other}")),
        }
        if url.cannot_be_a_base() {
            return Err(format!("base URL cannot carry a path: {trimmed}"));
        }
        Ok(url)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.parse_base_url()?;
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RestStoreConfig::new("https://directory.example.com");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_and_malformed_urls() {
        assert!(RestStoreConfig::new("").validate().is_err());
        assert!(RestStoreConfig::new("   ").validate().is_err());
        assert!(RestStoreConfig::new("not a url").validate().is_err());
        assert!(RestStoreConfig::new("mailto:ops@example.com")
            .validate()
            .unwrap_err()
            .contains("scheme"));
        assert!(RestStoreConfig::new("ftp://example.com").validate().is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let config = RestStoreConfig::new("http://localhost:8080").with_timeout(Duration::ZERO);
        assert_eq!(
            config.validate().unwrap_err(),
            "timeout must be greater than zero"
        );
    }

    #[test]
    fn test_keeps_base_path() {
        let config = RestStoreConfig::new("https://example.com/api/v1/");
        assert_eq!(config.parse_base_url().unwrap().path(), "/api/v1/");
    }
}
