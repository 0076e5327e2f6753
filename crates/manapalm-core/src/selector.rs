use std::collections::HashMap;

use manapalm_protocol::downstream::Tier;
use manapalm_provider_core::ProviderKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub provider: ProviderKind,
    pub model: String,
}

/// Default model per provider: configured override, else the adapter's built-in one.
#[derive(Debug, Clone, Default)]
pub struct ModelDefaults {
    models: HashMap<ProviderKind, String>,
}

impl ModelDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ProviderKind, model: impl Into<String>) -> Self {
        self.models.insert(kind, model.into());
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.models.get(&kind).map(String::as_str)
    }
}

pub fn default_provider(tier: Tier) -> ProviderKind {
    match tier {
        Tier::Premium => ProviderKind::OpenAI,
        Tier::Free => ProviderKind::OpenRouter,
    }
}

/// Picks the provider and model for one request. An explicit, non-empty field wins;
/// an unrecognized provider name is routed to openrouter.
pub fn select(
    requested_provider: Option<&str>,
    requested_model: Option<&str>,
    tier: Tier,
    defaults: &ModelDefaults,
) -> Selection {
    let provider = non_empty(requested_provider)
        .map(ProviderKind::resolve)
        .unwrap_or_else(|| default_provider(tier));
    let model = non_empty(requested_model)
        .or_else(|| defaults.get(provider))
        .unwrap_or_default()
        .to_string();
    Selection { provider, model }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
