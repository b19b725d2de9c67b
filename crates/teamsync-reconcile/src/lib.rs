//! teamsync reconciliation engine
//!
//! Brings a member's directory teams and chat platform roles into agreement.
//!
//! A run goes through five steps, each in its own module:
//!
//! 1. [`resolver`] - find both halves of the member's identity
//! 2. [`fetcher`] - read both membership sets and role ranks, once
//! 3. [`planner`] - pure set algebra producing add/remove lists per side
//! 4. [`authority`] - drop platform operations the acting agent cannot make
//! 5. [`applier`] - execute the rest, one outcome per operation
//!
//! [`orchestrator::SyncOrchestrator`] sequences them and produces a
//! [`report::SyncReport`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use teamsync_core::{CallContext, DirectoryMemberId, DirectoryTeamId, MemberRef};
//! use teamsync_reconcile::memory::{InMemoryDirectory, InMemoryPlatform};
//! use teamsync_reconcile::{SyncConfig, SyncDirection, SyncOrchestrator};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let team = DirectoryTeamId::new();
//! let member = DirectoryMemberId::new();
//! let directory = InMemoryDirectory::new()
//!     .with_team(team, Some("role-1".parse().unwrap()))
//!     .with_member(member, Some("42".parse().unwrap()), vec![team]);
//! let platform = InMemoryPlatform::new()
//!     .with_agent_max_position(10)
//!     .with_role("role-1".parse().unwrap(), 1)
//!     .with_member("42".parse().unwrap(), vec![]);
//!
//! let orchestrator =
//!     SyncOrchestrator::new(Arc::new(directory), Arc::new(platform), SyncConfig::default())
//!         .unwrap();
//! let report = orchestrator
//!     .sync(
//!         &CallContext::anonymous(),
//!         &MemberRef::Directory(member),
//!         SyncDirection::DirectoryToPlatform,
//!     )
//!     .await
//!     .unwrap();
//!
//! assert_eq!(report.summary.applied, 1);
//! # });
//! ```

pub mod applier;
pub mod authority;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod memory;
pub mod membership;
pub mod orchestrator;
pub mod planner;
pub mod report;
pub mod resolver;
pub mod types;

pub use applier::ChangeApplier;
pub use authority::{AuthorityFilter, AuthoritySnapshot, Exclusion, ExclusionReason};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use fetcher::{MembershipFetcher, MembershipSnapshot};
pub use membership::MembershipSet;
pub use orchestrator::SyncOrchestrator;
pub use planner::{plan, PlannedOperation, ReconciliationPlan};
pub use report::{OperationOutcome, ReportSummary, SyncReport, SyncWarning, WarningKind};
pub use resolver::IdentityResolver;
pub use types::{MembershipAction, MergePolicy, OutcomeStatus, SyncDirection, SyncState};
