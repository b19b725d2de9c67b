//! In-memory stores.
//!
//! [`InMemoryDirectory`] and [`InMemoryPlatform`] implement the store traits
//! over plain maps. They behave like the real services where it matters to
//! the engine: the platform refuses roles ranked at or above the agent,
//! reports duplicate adds and absent removes as no-ops, and either store can
//! be taken offline. [`FixtureState`] is their serde form, used for JSON
//! fixture files.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

use teamsync_core::{
    Credential, DirectoryMemberId, DirectoryStore, DirectoryTeamId, PlatformRoleId,
    PlatformStore, PlatformUserId, StoreError, StoreResult,
};

/// Member record in the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMemberRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<PlatformUserId>,
    #[serde(default)]
    pub teams: Vec<DirectoryTeamId>,
}

/// Team record in the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryTeamRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_role_id: Option<PlatformRoleId>,
}

/// Directory contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryState {
    #[serde(default)]
    pub members: BTreeMap<DirectoryMemberId, DirectoryMemberRecord>,
    #[serde(default)]
    pub teams: BTreeMap<DirectoryTeamId, DirectoryTeamRecord>,
}

/// Role record on the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRoleRecord {
    pub position: i64,
}

/// Platform contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformState {
    #[serde(default)]
    pub members: BTreeMap<PlatformUserId, Vec<PlatformRoleId>>,
    #[serde(default)]
    pub roles: BTreeMap<PlatformRoleId, PlatformRoleRecord>,
    /// Highest position held by the acting agent.
    #[serde(default)]
    pub agent_max_position: i64,
}

/// Both stores, as stored in a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureState {
    #[serde(default)]
    pub directory: DirectoryState,
    #[serde(default)]
    pub platform: PlatformState,
}

impl FixtureState {
    /// Parse a fixture from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Build live stores seeded with this state.
    #[must_use]
    pub fn into_stores(self) -> (InMemoryDirectory, InMemoryPlatform) {
        (
            InMemoryDirectory::from_state(self.directory),
            InMemoryPlatform::from_state(self.platform),
        )
    }

    /// Capture the current contents of both stores.
    pub async fn capture(directory: &InMemoryDirectory, platform: &InMemoryPlatform) -> Self {
        Self {
            directory: directory.snapshot().await,
            platform: platform.snapshot().await,
        }
    }
}

/// Directory store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    offline: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryDirectory {
    /// Empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory seeded with `state`.
    #[must_use]
    pub fn from_state(state: DirectoryState) -> Self {
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }

    /// Add a team, optionally linked to a platform role.
    #[must_use]
    pub fn with_team(mut self, team: DirectoryTeamId, role: Option<PlatformRoleId>) -> Self {
        self.state.get_mut().teams.insert(
            team,
            DirectoryTeamRecord {
                platform_role_id: role,
            },
        );
        self
    }

    /// Add a member, optionally linked to a platform user.
    #[must_use]
    pub fn with_member(
        mut self,
        member: DirectoryMemberId,
        platform_id: Option<PlatformUserId>,
        teams: Vec<DirectoryTeamId>,
    ) -> Self {
        self.state.get_mut().members.insert(
            member,
            DirectoryMemberRecord { platform_id, teams },
        );
        self
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of read calls served.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set_member_teams` calls served.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current teams of a member.
    pub async fn teams_of(&self, member: DirectoryMemberId) -> Vec<DirectoryTeamId> {
        self.state
            .read()
            .await
            .members
            .get(&member)
            .map(|record| record.teams.clone())
            .unwrap_or_default()
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> DirectoryState {
        self.state.read().await.clone()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("directory is offline"));
        }
        Ok(())
    }

    fn record_read(&self) -> StoreResult<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn get_member_teams(
        &self,
        _credential: &Credential,
        member: DirectoryMemberId,
    ) -> StoreResult<Vec<DirectoryTeamId>> {
        self.record_read()?;
        self.state
            .read()
            .await
            .members
            .get(&member)
            .map(|record| record.teams.clone())
            .ok_or_else(|| StoreError::rejected(format!("unknown member {member}")))
    }

    async fn set_member_teams(
        &self,
        _credential: &Credential,
        member: DirectoryMemberId,
        teams: &[DirectoryTeamId],
    ) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut state = self.state.write().await;
        let record = state
            .members
            .get_mut(&member)
            .ok_or_else(|| StoreError::rejected(format!("unknown member {member}")))?;
        record.teams = teams.to_vec();
        Ok(())
    }

    async fn get_team_by_role_id(
        &self,
        _credential: &Credential,
        role: &PlatformRoleId,
    ) -> StoreResult<Option<DirectoryTeamId>> {
        self.record_read()?;
        Ok(self
            .state
            .read()
            .await
            .teams
            .iter()
            .find(|(_, record)| record.platform_role_id.as_ref() == Some(role))
            .map(|(team, _)| *team))
    }

    async fn get_role_by_team_id(
        &self,
        _credential: &Credential,
        team: DirectoryTeamId,
    ) -> StoreResult<Option<PlatformRoleId>> {
        self.record_read()?;
        Ok(self
            .state
            .read()
            .await
            .teams
            .get(&team)
            .and_then(|record| record.platform_role_id.clone()))
    }

    async fn resolve_directory_id_by_platform_id(
        &self,
        _credential: &Credential,
        user: &PlatformUserId,
    ) -> StoreResult<Option<DirectoryMemberId>> {
        self.record_read()?;
        Ok(self
            .state
            .read()
            .await
            .members
            .iter()
            .find(|(_, record)| record.platform_id.as_ref() == Some(user))
            .map(|(member, _)| *member))
    }

    async fn resolve_platform_id_by_directory_id(
        &self,
        _credential: &Credential,
        member: DirectoryMemberId,
    ) -> StoreResult<Option<PlatformUserId>> {
        self.record_read()?;
        Ok(self
            .state
            .read()
            .await
            .members
            .get(&member)
            .and_then(|record| record.platform_id.clone()))
    }
}

/// Platform store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryPlatform {
    state: RwLock<PlatformState>,
    rejected_roles: BTreeSet<PlatformRoleId>,
    offline: AtomicBool,
    reads: AtomicUsize,
    add_calls: AtomicUsize,
    remove_calls: AtomicUsize,
}

impl InMemoryPlatform {
    /// Empty platform with an agent at position 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform seeded with `state`.
    #[must_use]
    pub fn from_state(state: PlatformState) -> Self {
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }

    /// Set the acting agent's highest position.
    #[must_use]
    pub fn with_agent_max_position(mut self, position: i64) -> Self {
        self.state.get_mut().agent_max_position = position;
        self
    }

    /// Add a role at the given position.
    #[must_use]
    pub fn with_role(mut self, role: PlatformRoleId, position: i64) -> Self {
        self.state
            .get_mut()
            .roles
            .insert(role, PlatformRoleRecord { position });
        self
    }

    /// Add a user holding `roles`.
    #[must_use]
    pub fn with_member(mut self, user: PlatformUserId, roles: Vec<PlatformRoleId>) -> Self {
        self.state.get_mut().members.insert(user, roles);
        self
    }

    /// Reject every mutation touching `role`.
    #[must_use]
    pub fn rejecting_role(mut self, role: PlatformRoleId) -> Self {
        self.rejected_roles.insert(role);
        self
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of read calls served.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `add_role` calls served.
    #[must_use]
    pub fn add_count(&self) -> usize {
        self.add_calls.load(Ordering::SeqCst)
    }

    /// Number of `remove_role` calls served.
    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.remove_calls.load(Ordering::SeqCst)
    }

    /// Current roles of a user.
    pub async fn roles_of(&self, user: &PlatformUserId) -> Vec<PlatformRoleId> {
        self.state
            .read()
            .await
            .members
            .get(user)
            .cloned()
            .unwrap_or_default()
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> PlatformState {
        self.state.read().await.clone()
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable("platform is offline"));
        }
        Ok(())
    }

    /// Checks every mutation goes through before touching state.
    fn check_mutation(&self, state: &PlatformState, role: &PlatformRoleId) -> StoreResult<()> {
        if self.rejected_roles.contains(role) {
            return Err(StoreError::rejected(format!("Missing Permissions for role {role}")));
        }
        let record = state
            .roles
            .get(role)
            .ok_or_else(|| StoreError::rejected(format!("Unknown Role {role}")))?;
        if record.position >= state.agent_max_position {
            return Err(StoreError::rejected(format!(
                "Missing Permissions: role {role} is not below the agent"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformStore for InMemoryPlatform {
    async fn get_member_roles(
        &self,
        _credential: &Credential,
        user: &PlatformUserId,
    ) -> StoreResult<Vec<PlatformRoleId>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        self.state
            .read()
            .await
            .members
            .get(user)
            .cloned()
            .ok_or_else(|| StoreError::rejected(format!("Unknown Member {user}")))
    }

    async fn add_role(
        &self,
        _credential: &Credential,
        user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut state = self.state.write().await;
        self.check_mutation(&state, role)?;
        let roles = state
            .members
            .get_mut(user)
            .ok_or_else(|| StoreError::rejected(format!("Unknown Member {user}")))?;
        if roles.contains(role) {
            return Err(StoreError::AlreadyPresent);
        }
        roles.push(role.clone());
        Ok(())
    }

    async fn remove_role(
        &self,
        _credential: &Credential,
        user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        let mut state = self.state.write().await;
        self.check_mutation(&state, role)?;
        let roles = state
            .members
            .get_mut(user)
            .ok_or_else(|| StoreError::rejected(format!("Unknown Member {user}")))?;
        if !roles.contains(role) {
            return Err(StoreError::AlreadyAbsent);
        }
        roles.retain(|r| r != role);
        Ok(())
    }

    async fn get_role_rank(
        &self,
        _credential: &Credential,
        role: &PlatformRoleId,
    ) -> StoreResult<Option<i64>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self
            .state
            .read()
            .await
            .roles
            .get(role)
            .map(|record| record.position))
    }

    async fn get_acting_agent_max_rank(&self, _credential: &Credential) -> StoreResult<i64> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.state.read().await.agent_max_position)
    }
}
