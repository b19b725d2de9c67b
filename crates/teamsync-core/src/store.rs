//! Store contracts
//!
//! The engine only ever talks to the directory and the chat platform through
//! these two traits. Implementations own transport concerns (timeouts,
//! retries, connection pooling); the engine owns decisions.
//!
//! Every method takes the [`Credential`] for its side as the first argument.

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::StoreResult;
use crate::ids::{DirectoryMemberId, DirectoryTeamId, PlatformRoleId, PlatformUserId};

/// The organizational directory.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Teams the member belongs to. An empty list is a valid answer.
    async fn get_member_teams(
        &self,
        credential: &Credential,
        member: DirectoryMemberId,
    ) -> StoreResult<Vec<DirectoryTeamId>>;

    /// Replace the member's team list.
    async fn set_member_teams(
        &self,
        credential: &Credential,
        member: DirectoryMemberId,
        teams: &[DirectoryTeamId],
    ) -> StoreResult<()>;

    /// Team whose record references the given platform role.
    async fn get_team_by_role_id(
        &self,
        credential: &Credential,
        role: &PlatformRoleId,
    ) -> StoreResult<Option<DirectoryTeamId>>;

    /// Platform role configured on the team, if any.
    async fn get_role_by_team_id(
        &self,
        credential: &Credential,
        team: DirectoryTeamId,
    ) -> StoreResult<Option<PlatformRoleId>>;

    /// Directory member linked to a platform user.
    async fn resolve_directory_id_by_platform_id(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
    ) -> StoreResult<Option<DirectoryMemberId>>;

    /// Platform user linked to a directory member.
    async fn resolve_platform_id_by_directory_id(
        &self,
        credential: &Credential,
        member: DirectoryMemberId,
    ) -> StoreResult<Option<PlatformUserId>>;
}

/// The chat platform.
#[async_trait]
pub trait PlatformStore: Send + Sync {
    /// Roles currently held by the user.
    async fn get_member_roles(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
    ) -> StoreResult<Vec<PlatformRoleId>>;

    /// Grant a role to the user.
    async fn add_role(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()>;

    /// Take a role away from the user.
    async fn remove_role(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()>;

    /// Hierarchy rank of the role; `None` when the role no longer exists.
    async fn get_role_rank(
        &self,
        credential: &Credential,
        role: &PlatformRoleId,
    ) -> StoreResult<Option<i64>>;

    /// Highest rank held by the agent performing mutations.
    async fn get_acting_agent_max_rank(&self, credential: &Credential) -> StoreResult<i64>;
}
