use std::sync::Arc;

use manapalm_provider_core::ProviderRegistry;

use crate::providers::google::GoogleProvider;
use crate::providers::openai::OpenAIProvider;
use crate::providers::openrouter::OpenRouterProvider;

pub fn register_builtin_providers(registry: &mut ProviderRegistry) {
    registry.register(Arc::new(OpenAIProvider::new()));
    registry.register(Arc::new(GoogleProvider::new()));
    registry.register(Arc::new(OpenRouterProvider::new()));
}

pub fn build_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    register_builtin_providers(&mut registry);
    registry
}
