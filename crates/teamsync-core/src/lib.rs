//! teamsync core library
//!
//! Shared vocabulary for keeping a chat platform's roles and an
//! organizational directory's team memberships in agreement.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers for both systems
//! - [`identity`] - Member and team identity pairs
//! - [`credential`] - Per-run credentials passed to every store call
//! - [`store`] - `DirectoryStore` and `PlatformStore` contracts
//! - [`error`] - Store error classification
//!
//! # Example
//!
//! ```
//! use teamsync_core::{CallContext, Credential, MemberRef};
//!
//! let ctx = CallContext::new(Credential::bearer("dir"), Credential::bearer("bot"));
//! let member = MemberRef::parse_auto("80351110224678912").unwrap();
//!
//! assert_eq!(member.kind().as_str(), "platform");
//! assert_eq!(ctx.platform().bearer_token(), Some("bot"));
//! ```

pub mod credential;
pub mod error;
pub mod identity;
pub mod ids;
pub mod store;

pub use credential::{CallContext, Credential};
pub use error::{StoreError, StoreKind, StoreResult};
pub use identity::{IdentityKind, MemberIdentity, MemberRef, TeamIdentity};
pub use ids::{DirectoryMemberId, DirectoryTeamId, ParseIdError, PlatformRoleId, PlatformUserId};
pub use store::{DirectoryStore, PlatformStore};

// Re-export async_trait for store implementors
pub use async_trait::async_trait;
