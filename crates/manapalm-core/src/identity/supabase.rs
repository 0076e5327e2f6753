use std::sync::Arc;

use async_trait::async_trait;

use manapalm_common::IdentityBackend;
use manapalm_protocol::supabase::{AuthUser, ProfileRow};
use manapalm_provider_core::{
    Headers, HttpMethod, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse, header_set,
};

use super::{IdentityError, IdentityProvider};
use crate::upstream_client::UpstreamClient;

const PROFILE_COLUMNS: &str = "is_admin,metadata";

/// Supabase auth (`/auth/v1/user`) plus the `profiles` table over PostgREST.
pub struct SupabaseIdentity {
    client: Arc<dyn UpstreamClient>,
    backend: IdentityBackend,
}

impl SupabaseIdentity {
    pub fn new(client: Arc<dyn UpstreamClient>, backend: IdentityBackend) -> Self {
        Self { client, backend }
    }

    pub fn user_request(&self, token: &str) -> UpstreamHttpRequest {
        UpstreamHttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/auth/v1/user", self.backend.url),
            headers: self.headers(token),
            body: None,
        }
    }

    pub fn profile_request(&self, user_id: &str) -> Result<UpstreamHttpRequest, IdentityError> {
        let query = serde_urlencoded::to_string([
            ("id", format!("eq.{user_id}")),
            ("select", PROFILE_COLUMNS.to_string()),
        ])
        .map_err(|err| IdentityError::Decode(err.to_string()))?;
        Ok(UpstreamHttpRequest {
            method: HttpMethod::Get,
            url: format!("{}/rest/v1/profiles?{query}", self.backend.url),
            headers: self.headers(&self.backend.service_key),
            body: None,
        })
    }

    fn headers(&self, bearer: &str) -> Headers {
        let mut headers = Vec::new();
        header_set(&mut headers, "apikey", self.backend.service_key.clone());
        header_set(&mut headers, "Authorization", format!("Bearer {bearer}"));
        header_set(&mut headers, "Accept", "application/json");
        headers
    }

    async fn fetch(&self, req: UpstreamHttpRequest) -> Result<UpstreamHttpResponse, IdentityError> {
        let response = self.client.send(req).await?;
        if !response.is_success() {
            return Err(UpstreamFailure::from_response(response).into());
        }
        Ok(response)
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn user_id(&self, token: &str) -> Result<String, IdentityError> {
        let response = self.fetch(self.user_request(token)).await?;
        let user: AuthUser = serde_json::from_slice(&response.body)
            .map_err(|err| IdentityError::Decode(err.to_string()))?;
        if user.id.trim().is_empty() {
            return Err(IdentityError::Decode("empty user id".to_string()));
        }
        Ok(user.id)
    }

    async fn profile(&self, user_id: &str) -> Result<ProfileRow, IdentityError> {
        let response = self.fetch(self.profile_request(user_id)?).await?;
        let rows: Vec<ProfileRow> = serde_json::from_slice(&response.body)
            .map_err(|err| IdentityError::Decode(err.to_string()))?;
        rows.into_iter()
            .next()
            .ok_or_else(|| IdentityError::ProfileNotFound(user_id.to_string()))
    }
}
