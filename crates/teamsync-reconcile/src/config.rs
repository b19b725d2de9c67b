//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::types::MergePolicy;

/// Upper bound for concurrent platform partitions.
pub const MAX_CONCURRENCY_LIMIT: usize = 64;

/// Settings for one [`crate::SyncOrchestrator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Merge policy applied to every run.
    #[serde(default)]
    pub merge_policy: MergePolicy,
    /// Plan and report without mutating either store.
    #[serde(default)]
    pub dry_run: bool,
    /// How many platform role partitions may be in flight at once.
    #[serde(default = "default_max_concurrent_operations")]
    pub max_concurrent_operations: usize,
}

fn default_max_concurrent_operations() -> usize {
    4
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::default(),
            dry_run: false,
            max_concurrent_operations: default_max_concurrent_operations(),
        }
    }
}

impl SyncConfig {
    /// Set the merge policy.
    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Set dry run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the concurrency cap.
    #[must_use]
    pub fn with_max_concurrent_operations(mut self, max: usize) -> Self {
        self.max_concurrent_operations = max;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.max_concurrent_operations == 0 {
            return Err(SyncError::configuration(
                "max_concurrent_operations must be at least 1",
            ));
        }
        if self.max_concurrent_operations > MAX_CONCURRENCY_LIMIT {
            return Err(SyncError::configuration(format!(
                "max_concurrent_operations must be at most {MAX_CONCURRENCY_LIMIT}"
            )));
        }
        Ok(())
    }
}
