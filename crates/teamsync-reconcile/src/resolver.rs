//! Identity resolution.
//!
//! Turns one known identifier into a full [`MemberIdentity`] by looking up
//! the link stored on the directory member record. Never creates records.

use std::sync::Arc;
use tracing::{debug, instrument};

use teamsync_core::{CallContext, DirectoryStore, MemberIdentity, MemberRef, StoreKind};

use crate::error::{SyncError, SyncResult};

/// Resolves a member across both systems.
#[derive(Clone)]
pub struct IdentityResolver {
    directory: Arc<dyn DirectoryStore>,
}

impl IdentityResolver {
    /// Create a resolver backed by the directory.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryStore>) -> Self {
        Self { directory }
    }

    /// Look up the missing half of `member`.
    ///
    /// Fails with [`SyncError::NotFound`] when no linked record exists and
    /// [`SyncError::UpstreamUnavailable`] when the directory cannot be
    /// reached.
    #[instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn resolve(
        &self,
        ctx: &CallContext,
        member: &MemberRef,
    ) -> SyncResult<MemberIdentity> {
        let identity = match member {
            MemberRef::Directory(directory_id) => {
                let platform_id = self
                    .directory
                    .resolve_platform_id_by_directory_id(ctx.directory(), *directory_id)
                    .await
                    .map_err(|e| SyncError::from_store(StoreKind::Directory, &e))?
                    .ok_or_else(|| {
                        SyncError::not_found(
                            "platform identity for directory member",
                            directory_id.to_string(),
                        )
                    })?;
                MemberIdentity::new(*directory_id, platform_id)
            }
            MemberRef::Platform(platform_id) => {
                let directory_id = self
                    .directory
                    .resolve_directory_id_by_platform_id(ctx.directory(), platform_id)
                    .await
                    .map_err(|e| SyncError::from_store(StoreKind::Directory, &e))?
                    .ok_or_else(|| {
                        SyncError::not_found(
                            "directory member for platform user",
                            platform_id.as_str(),
                        )
                    })?;
                MemberIdentity::new(directory_id, platform_id.clone())
            }
        };

        debug!(identity = %identity, "Resolved member identity");
        Ok(identity)
    }
}
