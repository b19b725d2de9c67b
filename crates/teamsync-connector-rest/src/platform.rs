//! Chat platform over HTTP.
//!
//! `PUT` on a role the member already holds answers 409 and `DELETE` on a
//! role the member lacks answers 404; both are reported as the matching
//! no-op error so the engine can count them as applied.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use teamsync_core::{
    Credential, PlatformRoleId, PlatformStore, PlatformUserId, StoreError, StoreResult,
};
use tracing::{debug, instrument};

use crate::client::RestClient;
use crate::config::RestStoreConfig;

#[derive(Debug, Deserialize)]
struct RolesBody {
    roles: Vec<PlatformRoleId>,
}

#[derive(Debug, Deserialize)]
struct RoleRecord {
    position: i64,
}

#[derive(Debug, Deserialize)]
struct AgentRecord {
    max_position: i64,
}

/// [`PlatformStore`] backed by the chat platform's REST API.
#[derive(Debug, Clone)]
pub struct RestPlatformStore {
    client: RestClient,
}

impl RestPlatformStore {
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
impl PlatformStore for RestPlatformStore {
    #[instrument(skip_all, fields(store = "platform", member = %user))]
    async fn get_member_roles(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
    ) -> StoreResult<Vec<PlatformRoleId>> {
        let url = self.client.endpoint(&["members", user.as_str(), "roles"])?;
        let body: RolesBody = self.client.get_json(credential, &url).await?;
        Ok(body.roles)
    }

    #[instrument(skip_all, fields(store = "platform", member = %user, role_id = %role))]
    async fn add_role(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()> {
        let url = self
            .client
            .endpoint(&["members", user.as_str(), "roles", role.as_str()])?;
        let response = self
            .client
            .send(credential, Method::PUT, &url, None, &[StatusCode::CONFLICT])
            .await?;
        if response.status() == StatusCode::CONFLICT {
            debug!("Role already held");
            return Err(StoreError::AlreadyPresent);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(store = "platform", member = %user, role_id = %role))]
    async fn remove_role(
        &self,
        credential: &Credential,
        user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()> {
        let url = self
            .client
            .endpoint(&["members", user.as_str(), "roles", role.as_str()])?;
        let response = self
            .client
            .send(
                credential,
                Method::DELETE,
                &url,
                None,
                &[StatusCode::NOT_FOUND],
            )
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("Role already absent");
            return Err(StoreError::AlreadyAbsent);
        }
        Ok(())
    }

    #[instrument(skip_all, fields(store = "platform", role_id = %role))]
    async fn get_role_rank(
        &self,
        credential: &Credential,
        role: &PlatformRoleId,
    ) -> StoreResult<Option<i64>> {
        let url = self.client.endpoint(&["roles", role.as_str()])?;
        let record: Option<RoleRecord> = self.client.get_optional(credential, &url).await?;
        Ok(record.map(|r| r.position))
    }

    #[instrument(skip_all, fields(store = "platform"))]
    async fn get_acting_agent_max_rank(&self, credential: &Credential) -> StoreResult<i64> {
        let url = self.client.endpoint(&["agent"])?;
        let record: AgentRecord = self.client.get_json(credential, &url).await?;
        Ok(record.max_position)
    }
}
