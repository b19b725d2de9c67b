//! REST stores for teamsync
//!
//! HTTP/JSON implementations of [`teamsync_core::DirectoryStore`] and
//! [`teamsync_core::PlatformStore`].
//!
//! Every request carries the bearer credential from the caller's
//! [`teamsync_core::CallContext`]; the stores hold no authentication state of
//! their own. HTTP outcomes are mapped straight into
//! [`teamsync_core::StoreError`], and transient failures are retried by a
//! bounded [`RetryPolicy`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use teamsync_connector_rest::{RestDirectoryStore, RestStoreConfig, RetryPolicy};
//!
//! let config = RestStoreConfig::new("https://directory.example.com/api")
//!     .with_timeout(Duration::from_secs(5))
//!     .with_retry(RetryPolicy::new(3, Duration::from_millis(250)));
//! let directory = RestDirectoryStore::new(&config).unwrap();
//! ```

pub mod client;
pub mod config;
pub mod directory;
pub mod platform;
pub mod retry;

pub use client::{error_for_status, RestClient};
pub use config::RestStoreConfig;
pub use directory::RestDirectoryStore;
pub use platform::RestPlatformStore;
pub use retry::RetryPolicy;
