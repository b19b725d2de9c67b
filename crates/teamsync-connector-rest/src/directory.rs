//! Directory service over HTTP.
//!
//! | Call | Request | Response |
//! |---|---|---|
//! | member teams | `GET /members/{id}/teams` | `{"teams": [uuid]}` |
//! | replace teams | `PUT /members/{id}/teams` | 2xx |
//! | member record | `GET /members/{id}` | `{"id", "platform_id"}` |
//! | member by platform ID | `GET /members/by-platform/{platform_id}` | `{"id"}` |
//! | team record | `GET /teams/{id}` | `{"id", "platform_role_id"}` |
//! | team by role | `GET /teams/by-role/{role_id}` | `{"id"}` |
//!
//! Lookups answer 404 when nothing matches.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use teamsync_core::{
    Credential, DirectoryMemberId, DirectoryStore, DirectoryTeamId, PlatformRoleId,
    PlatformUserId, StoreError, StoreResult,
};
use tracing::instrument;

use crate::client::RestClient;
use crate::config::RestStoreConfig;

#[derive(Debug, Serialize, Deserialize)]
struct TeamsBody {
    teams: Vec<DirectoryTeamId>,
}

#[derive(Debug, Deserialize)]
struct MemberRecord {
    #[serde(default)]
    platform_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TeamRecord {
    #[serde(default)]
    platform_role_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdRecord<T> {
    id: T,
}

/// Parse an optional platform ID where a blank string means "not set".
fn non_blank<T>(raw: Option<String>) -> StoreResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) if !value.trim().is_empty() => value
            .parse()
            .map(Some)
            .map_err(|e: T::Err| StoreError::invalid_data(e.to_string())),
        _ => Ok(None),
    }
}

/// [`DirectoryStore`] backed by the directory's REST API.
#[derive(Debug, Clone)]
pub struct RestDirectoryStore {
    client: RestClient,
}

impl RestDirectoryStore {
    /// Create a store from configuration.
    pub fn new(config: &RestStoreConfig) -> Result<Self, String> {
        Ok(Self::with_client(RestClient::new(config)?))
    }

    /// Create a store around an existing client.
    #[must_use]
    pub fn with_client(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DirectoryStore for RestDirectoryStore {
    #[instrument(skip_all, fields(store = "directory", member = %member))]
    async fn get_member_teams(
        &self,
        credential: &Credential,
        member: DirectoryMemberId,
    ) -> StoreResult<Vec<DirectoryTeamId>> {
        let url = self
            .client
            .endpoint(&["members", &member.to_string(), "teams"])?;
        let body: TeamsBody = self.client.get_json(credential, &url).await?;
        Ok(body.teams)
    }

    #[instrument(skip_all, fields(store = "directory", member = %member, teams = teams.len()))]
    async fn set_member_teams(
        &self,
        credential: &Credential,
        member: DirectoryMemberId,
        teams: &[DirectoryTeamId],
    ) -> StoreResult<()> {
        let url = self
            .client
            .endpoint(&["members", &member.to_string(), "teams"])?;
        let body = serde_json::to_value(TeamsBody {
            teams: teams.to_vec(),
        })
        .map_err(|e| StoreError::invalid_data(e.to_string()))?;
        self.client
            .send(credential, Method::PUT, &url, Some(&body), &[])
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(store = "directory", role_id = %role))]
    async fn get_team_by_role_id(
        &self,
        credential: &Credential,
        role: &PlatformRoleId,
    ) -> StoreResult<Option<DirectoryTeamId>> {
        let url = self.client.endpoint(&["teams", "by-role", role.as_str()])?;
        let record: Option<IdRecord<DirectoryTeamId>> =
            self.client.get_optional(credential, &url).await?;
        Ok(record.map(|r| r.id))
    }

    #[instrument(skip_all, fields(store = "directory", team_id = %team))]
    async fn get_role_by_team_id(
        &self,
        credential: &Credential,
        team: DirectoryTeamId,
    ) -> StoreResult<Option<PlatformRoleId>> {
        let url = self.client.endpoint(&["teams", &team.to_string()])?;
        match self.client.get_optional::<TeamRecord>(credential, &url).await? {
            Some(record) => non_blank(record.platform_role_id),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, fields(store = "directory", platform_id = %user))]
    async fn resolve_directory_id_by_platform_id(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
    ) -> StoreResult<Option<DirectoryMemberId>> {
        let url = self
            .client
            .endpoint(&["members", "by-platform", user.as_str()])?;
        let record: Option<IdRecord<DirectoryMemberId>> =
            self.client.get_optional(credential, &url).await?;
        Ok(record.map(|r| r.id))
    }

    #[instrument(skip_all, fields(store = "directory", member = %member))]
    async fn resolve_platform_id_by_directory_id(
        &self,
        credential: &Credential,
        member: DirectoryMemberId,
    ) -> StoreResult<Option<PlatformUserId>> {
        let url = self.client.endpoint(&["members", &member.to_string()])?;
        match self
            .client
            .get_optional::<MemberRecord>(credential, &url)
            .await?
        {
            Some(record) => non_blank(record.platform_id),
            None => Ok(None),
        }
    }
}
