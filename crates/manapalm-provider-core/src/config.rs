use crate::errors::{ProviderError, ProviderResult};
use crate::provider::ProviderKind;

/// Runtime settings for one provider, resolved from the global config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Overrides the adapter's built-in default model.
    pub model: Option<String>,
    /// Only honoured by providers that declare a retry policy.
    pub max_retries: u32,
}

impl ProviderSettings {
    pub fn api_key(&self, kind: ProviderKind) -> ProviderResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ProviderError::MissingApiKey(kind))
    }

    pub fn base_url<'a>(&'a self, default_base: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .unwrap_or(default_base)
            .trim_end_matches('/')
    }
}
