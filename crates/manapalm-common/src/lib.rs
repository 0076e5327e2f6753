use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Backoff doubles per attempt, so anything above this waits for minutes.
pub const MAX_RETRIES_LIMIT: u32 = 6;
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://nakhlestanmana.com",
    "https://www.nakhlestanmana.com",
    "http://localhost:3000",
];

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("missing required global config field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Per-provider upstream settings. Every field is optional: a missing key only
/// fails the requests routed to that provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Overrides the adapter's built-in default model.
    pub model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityBackend {
    pub url: String,
    pub service_key: String,
}

/// Final, merged global configuration used by the running process.
///
/// Merge order: CLI > ENV > built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Optional outbound proxy (for upstream egress).
    pub proxy: Option<String>,
    pub allowed_origins: Vec<String>,
    /// Retry budget for the retry-wrapped adapter.
    pub max_retries: u32,
    pub openai: ProviderEndpoint,
    pub google: ProviderEndpoint,
    pub openrouter: ProviderEndpoint,
    /// Model used on the fallback attempt; defaults to the openrouter model.
    pub fallback_model: Option<String>,
    /// `None` disables identity lookups: every caller is anonymous.
    pub identity: Option<IdentityBackend>,
}

impl GlobalConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CLI/ENV values before built-in defaults are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub proxy: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
    pub max_retries: Option<u32>,
    pub openai: ProviderEndpoint,
    pub google: ProviderEndpoint,
    pub openrouter: ProviderEndpoint,
    pub fallback_model: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
}

impl GlobalConfigPatch {
    pub fn into_config(self) -> Result<GlobalConfig, GlobalConfigError> {
        let max_retries = self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
        if max_retries > MAX_RETRIES_LIMIT {
            return Err(GlobalConfigError::InvalidValue {
                field: "max_retries",
                reason: format!("must be at most {MAX_RETRIES_LIMIT}, got {max_retries}"),
            });
        }

        let identity = match (self.supabase_url, self.supabase_service_key) {
            (Some(url), Some(service_key)) => Some(IdentityBackend {
                url: url.trim_end_matches('/').to_string(),
                service_key,
            }),
            (Some(_), None) => return Err(GlobalConfigError::MissingField("supabase_service_key")),
            (None, Some(_)) => return Err(GlobalConfigError::MissingField("supabase_url")),
            (None, None) => None,
        };

        let allowed_origins = self.allowed_origins.unwrap_or_else(|| {
            DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|origin| origin.to_string())
                .collect()
        });

        Ok(GlobalConfig {
            host: self.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: self.port.unwrap_or(DEFAULT_PORT),
            proxy: self.proxy,
            allowed_origins,
            max_retries,
            openai: self.openai,
            google: self.google,
            openrouter: self.openrouter,
            fallback_model: self.fallback_model,
            identity,
        })
    }
}
