use std::sync::Arc;

use async_trait::async_trait;
use http::HeaderMap;
use tracing::{info, warn};

use manapalm_protocol::downstream::Tier;
use manapalm_protocol::supabase::ProfileRow;
use manapalm_provider_core::UpstreamFailure;

mod supabase;

pub use supabase::SupabaseIdentity;

pub const ANONYMOUS_ID_HEADER: &str = "x-user-id";

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity backend not configured")]
    Disabled,
    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),
    #[error("identity response decode failed: {0}")]
    Decode(String),
    #[error("no profile row for user {0}")]
    ProfileNotFound(String),
}

/// External user directory: token to user id, user id to profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn user_id(&self, token: &str) -> Result<String, IdentityError>;

    async fn profile(&self, user_id: &str) -> Result<ProfileRow, IdentityError>;
}

/// Used when no identity backend is configured. Every token degrades to free.
#[derive(Debug, Default)]
pub struct DisabledIdentity;

#[async_trait]
impl IdentityProvider for DisabledIdentity {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn user_id(&self, _token: &str) -> Result<String, IdentityError> {
        Err(IdentityError::Disabled)
    }

    async fn profile(&self, _user_id: &str) -> Result<ProfileRow, IdentityError> {
        Err(IdentityError::Disabled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerQuota {
    pub caller_id: Option<String>,
    pub tier: Tier,
    pub remaining_seconds: i64,
    pub authenticated: bool,
}

impl CallerQuota {
    pub fn anonymous(anonymous_id: Option<&str>) -> Self {
        Self {
            caller_id: anonymous_id.map(str::to_string),
            tier: Tier::Free,
            remaining_seconds: 0,
            authenticated: false,
        }
    }

    pub fn from_profile(user_id: String, profile: &ProfileRow) -> Self {
        let remaining_seconds = profile.live_access_remaining_seconds();
        let tier = if profile.is_admin() || remaining_seconds > 0 {
            Tier::Premium
        } else {
            Tier::Free
        };
        Self {
            caller_id: Some(user_id),
            tier,
            remaining_seconds,
            authenticated: true,
        }
    }
}

/// Resolves the caller's tier. Never fails: lookup errors fall back to anonymous/free.
#[derive(Clone)]
pub struct QuotaResolver {
    provider: Arc<dyn IdentityProvider>,
}

impl QuotaResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledIdentity))
    }

    pub async fn resolve(
        &self,
        token: Option<&str>,
        anonymous_id: Option<&str>,
        trace_id: &str,
    ) -> CallerQuota {
        let quota = match token {
            None => CallerQuota::anonymous(anonymous_id),
            Some(token) => match self.lookup(token).await {
                Ok(quota) => quota,
                Err(err) => {
                    warn!(
                        event = "identity_degraded",
                        trace_id = %trace_id,
                        backend = self.provider.name(),
                        error = %err
                    );
                    CallerQuota::anonymous(anonymous_id)
                }
            },
        };
        info!(
            event = "quota_resolved",
            trace_id = %trace_id,
            caller_id = ?quota.caller_id,
            tier = %quota.tier,
            remaining_seconds = quota.remaining_seconds,
            authenticated = quota.authenticated
        );
        quota
    }

    async fn lookup(&self, token: &str) -> Result<CallerQuota, IdentityError> {
        let user_id = self.provider.user_id(token).await?;
        let profile = self.provider.profile(&user_id).await?;
        Ok(CallerQuota::from_profile(user_id, &profile))
    }
}

/// `Authorization: Bearer <token>`; any other scheme or an empty token is no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = header_value(headers, http::header::AUTHORIZATION.as_str())?;
    let auth = auth.trim();
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

pub fn anonymous_id(headers: &HeaderMap) -> Option<String> {
    header_value(headers, ANONYMOUS_ID_HEADER)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}
