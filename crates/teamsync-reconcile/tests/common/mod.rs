//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use uuid::Uuid;

use teamsync_core::{
    CallContext, Credential, DirectoryMemberId, DirectoryTeamId, PlatformRoleId, PlatformUserId,
    TeamIdentity,
};
use teamsync_reconcile::memory::{InMemoryDirectory, InMemoryPlatform};
use teamsync_reconcile::{MembershipSet, SyncConfig, SyncOrchestrator};

/// Agent position used unless a test says otherwise.
pub const AGENT_MAX: i64 = 100;

pub fn team(n: u128) -> DirectoryTeamId {
    DirectoryTeamId::from_uuid(Uuid::from_u128(n))
}

pub fn role(n: u128) -> PlatformRoleId {
    format!("role-{n}").parse().unwrap()
}

pub fn pair(n: u128) -> TeamIdentity {
    TeamIdentity::new(team(n), role(n))
}

pub fn set(ns: &[u128]) -> MembershipSet {
    ns.iter().map(|n| pair(*n)).collect()
}

pub fn member() -> DirectoryMemberId {
    DirectoryMemberId::from_uuid(Uuid::from_u128(0xA11CE))
}

pub fn user() -> PlatformUserId {
    "80351110224678912".parse().unwrap()
}

pub fn ctx() -> CallContext {
    CallContext::new(
        Credential::bearer("dir-token"),
        Credential::bearer("bot-token"),
    )
}

/// Directory where team `n` maps to `role-n` for every `n` in `mapped`, and
/// the member belongs to `member_teams`.
pub fn directory(mapped: &[u128], member_teams: &[u128]) -> InMemoryDirectory {
    let directory = mapped
        .iter()
        .fold(InMemoryDirectory::new(), |d, n| d.with_team(team(*n), Some(role(*n))));
    directory.with_member(
        member(),
        Some(user()),
        member_teams.iter().map(|n| team(*n)).collect(),
    )
}

/// Platform where `role-n` sits at position `n` for every `n` in `roles`, and
/// the user holds `member_roles`.
pub fn platform(roles: &[u128], member_roles: &[u128], agent_max: i64) -> InMemoryPlatform {
    let platform = roles.iter().fold(
        InMemoryPlatform::new().with_agent_max_position(agent_max),
        |p, n| p.with_role(role(*n), *n as i64),
    );
    platform.with_member(user(), member_roles.iter().map(|n| role(*n)).collect())
}

pub fn orchestrator(
    directory: &Arc<InMemoryDirectory>,
    platform: &Arc<InMemoryPlatform>,
    config: SyncConfig,
) -> SyncOrchestrator {
    SyncOrchestrator::new(directory.clone(), platform.clone(), config).unwrap()
}

pub async fn directory_teams(directory: &InMemoryDirectory) -> Vec<DirectoryTeamId> {
    let mut teams = directory.teams_of(member()).await;
    teams.sort();
    teams
}

pub async fn platform_roles(platform: &InMemoryPlatform) -> Vec<PlatformRoleId> {
    let mut roles = platform.roles_of(&user()).await;
    roles.sort();
    roles
}

pub fn teams(ns: &[u128]) -> Vec<DirectoryTeamId> {
    let mut teams: Vec<_> = ns.iter().map(|n| team(*n)).collect();
    teams.sort();
    teams
}

pub fn roles(ns: &[u128]) -> Vec<PlatformRoleId> {
    let mut roles: Vec<_> = ns.iter().map(|n| role(*n)).collect();
    roles.sort();
    roles
}
