//! Membership fetching.
//!
//! Reads one member's current teams from the directory and roles from the
//! platform, translates both into [`TeamIdentity`] pairs through the
//! directory's team/role mapping, and (when the platform will be written)
//! snapshots role ranks for the authority filter. Everything a run needs is
//! read here, once, before planning.

use futures::future::try_join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use teamsync_core::{
    CallContext, DirectoryStore, DirectoryTeamId, MemberIdentity, PlatformRoleId, PlatformStore,
    StoreKind, TeamIdentity,
};

use crate::authority::AuthoritySnapshot;
use crate::error::{SyncError, SyncResult};
use crate::membership::MembershipSet;
use crate::report::SyncWarning;

/// Both sides' view of a member at the start of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSnapshot {
    pub directory: MembershipSet,
    pub platform: MembershipSet,
    /// Present when the platform side will be written.
    pub authority: Option<AuthoritySnapshot>,
    pub warnings: Vec<SyncWarning>,
}

/// Reads membership from both stores.
#[derive(Clone)]
pub struct MembershipFetcher {
    directory: Arc<dyn DirectoryStore>,
    platform: Arc<dyn PlatformStore>,
}

impl MembershipFetcher {
    /// Create a fetcher over both stores.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryStore>, platform: Arc<dyn PlatformStore>) -> Self {
        Self {
            directory,
            platform,
        }
    }

    /// Fetch both membership sets for a resolved member.
    ///
    /// `identity` is `None` when resolution has not happened, which is
    /// reported as [`SyncError::IdentityNotResolved`]. An empty list from a
    /// store is a valid answer. Store failures are classified by
    /// [`SyncError::from_store`].
    #[instrument(skip(self, ctx, identity), fields(request_id = %ctx.request_id()))]
    pub async fn fetch(
        &self,
        ctx: &CallContext,
        identity: Option<&MemberIdentity>,
        needs_authority: bool,
    ) -> SyncResult<MembershipSnapshot> {
        let identity = identity.ok_or(SyncError::IdentityNotResolved)?;

        let (team_ids, role_ids) = tokio::try_join!(
            async {
                self.directory
                    .get_member_teams(ctx.directory(), identity.directory_id())
                    .await
                    .map_err(|e| SyncError::from_store(StoreKind::Directory, &e))
            },
            async {
                self.platform
                    .get_member_roles(ctx.platform(), identity.platform_id())
                    .await
                    .map_err(|e| SyncError::from_store(StoreKind::Platform, &e))
            },
        )?;

        let team_ids = dedup(team_ids);
        let role_ids = dedup(role_ids);
        let mut warnings = Vec::new();

        let (directory, platform) = tokio::try_join!(
            self.map_teams(ctx, &team_ids),
            self.map_roles(ctx, &role_ids),
        )?;

        let mut directory_set = MembershipSet::new();
        for (team_id, role) in team_ids.iter().zip(directory) {
            match role {
                Some(role_id) => {
                    directory_set.insert(TeamIdentity::new(*team_id, role_id));
                }
                None => {
                    warn!(team_id = %team_id, "Dropping directory team with no platform role");
                    warnings.push(SyncWarning::unmapped_team(*team_id));
                }
            }
        }

        // A role shared by several teams pairs with the member's own teams, so
        // neither side sees the other's pairing as a removal.
        let mut held: BTreeMap<PlatformRoleId, Vec<DirectoryTeamId>> = BTreeMap::new();
        for pairing in directory_set.iter() {
            held.entry(pairing.role_id.clone())
                .or_default()
                .push(pairing.team_id);
        }

        let mut platform_set = MembershipSet::new();
        for (role_id, team) in role_ids.iter().zip(platform) {
            if let Some(held_teams) = held.get(role_id) {
                if held_teams.len() > 1 || team.is_some_and(|t| !held_teams.contains(&t)) {
                    warn!(
                        role_id = %role_id,
                        "Platform role is mapped from more than one directory team"
                    );
                    warnings.push(SyncWarning::ambiguous_role(role_id.clone(), held_teams));
                }
                for team_id in held_teams {
                    platform_set.insert(TeamIdentity::new(*team_id, role_id.clone()));
                }
                continue;
            }
            match team {
                Some(team_id) => {
                    platform_set.insert(TeamIdentity::new(team_id, role_id.clone()));
                }
                None => {
                    warn!(role_id = %role_id, "Dropping platform role with no directory team");
                    warnings.push(SyncWarning::unmapped_role(role_id.clone()));
                }
            }
        }

        let authority = if needs_authority {
            Some(self.snapshot_authority(ctx, &directory_set, &platform_set).await?)
        } else {
            None
        };

        debug!(
            directory_teams = directory_set.len(),
            platform_roles = platform_set.len(),
            warnings = warnings.len(),
            "Fetched membership"
        );

        Ok(MembershipSnapshot {
            directory: directory_set,
            platform: platform_set,
            authority,
            warnings,
        })
    }

    async fn map_teams(
        &self,
        ctx: &CallContext,
        team_ids: &[DirectoryTeamId],
    ) -> SyncResult<Vec<Option<PlatformRoleId>>> {
        try_join_all(team_ids.iter().map(|team_id| async move {
            self.directory
                .get_role_by_team_id(ctx.directory(), *team_id)
                .await
                .map_err(|e| SyncError::from_store(StoreKind::Directory, &e))
        }))
        .await
    }

    async fn map_roles(
        &self,
        ctx: &CallContext,
        role_ids: &[PlatformRoleId],
    ) -> SyncResult<Vec<Option<DirectoryTeamId>>> {
        try_join_all(role_ids.iter().map(|role_id| async move {
            self.directory
                .get_team_by_role_id(ctx.directory(), role_id)
                .await
                .map_err(|e| SyncError::from_store(StoreKind::Directory, &e))
        }))
        .await
    }

    async fn snapshot_authority(
        &self,
        ctx: &CallContext,
        directory: &MembershipSet,
        platform: &MembershipSet,
    ) -> SyncResult<AuthoritySnapshot> {
        let roles: BTreeSet<PlatformRoleId> = directory
            .role_ids()
            .into_iter()
            .chain(platform.role_ids())
            .collect();

        let (max_rank, ranks) = tokio::try_join!(
            async {
                self.platform
                    .get_acting_agent_max_rank(ctx.platform())
                    .await
                    .map_err(|e| SyncError::from_store(StoreKind::Platform, &e))
            },
            try_join_all(roles.iter().map(|role_id| async move {
                self.platform
                    .get_role_rank(ctx.platform(), role_id)
                    .await
                    .map(|rank| (role_id.clone(), rank))
                    .map_err(|e| SyncError::from_store(StoreKind::Platform, &e))
            })),
        )?;

        Ok(ranks
            .into_iter()
            .fold(AuthoritySnapshot::new(max_rank), |snapshot, (role, rank)| {
                snapshot.with_rank(role, rank)
            }))
    }
}

/// Drop repeated IDs, keeping first-seen order.
fn dedup<T: Ord + Clone>(ids: Vec<T>) -> Vec<T> {
    let mut seen = BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
