use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use manapalm_provider_core::{
    ChatRequest, ProviderError, ProviderKind, ProviderRegistry, ProviderSettings,
    UpstreamFailure,
};

use crate::selector::{ModelDefaults, Selection};
use crate::upstream_client::{CallCtx, UpstreamClient, send_with_retry};

mod fallback;

pub use fallback::{Attempt, FALLBACK_SUFFIX, Generation};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("provider {0} is not registered")]
    Unregistered(ProviderKind),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),
}

/// Turns a chat request into one upstream call against one provider.
pub struct ProxyEngine {
    client: Arc<dyn UpstreamClient>,
    registry: Arc<ProviderRegistry>,
    settings: HashMap<ProviderKind, ProviderSettings>,
    defaults: ModelDefaults,
    fallback: Selection,
}

impl ProxyEngine {
    /// `fallback_model` of `None` uses openrouter's default model.
    pub fn new(
        client: Arc<dyn UpstreamClient>,
        registry: Arc<ProviderRegistry>,
        settings: HashMap<ProviderKind, ProviderSettings>,
        fallback_model: Option<String>,
    ) -> Self {
        let defaults = model_defaults(&registry, &settings);
        let fallback = Selection {
            provider: ProviderKind::OpenRouter,
            model: fallback_model
                .filter(|model| !model.trim().is_empty())
                .or_else(|| defaults.get(ProviderKind::OpenRouter).map(str::to_string))
                .unwrap_or_default(),
        };
        Self {
            client,
            registry,
            settings,
            defaults,
            fallback,
        }
    }

    pub fn fallback(&self) -> &Selection {
        &self.fallback
    }

    pub fn model_defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    pub async fn generate(
        &self,
        trace_id: &str,
        kind: ProviderKind,
        req: &ChatRequest,
    ) -> Result<String, EngineError> {
        let provider = self
            .registry
            .get(kind)
            .ok_or(EngineError::Unregistered(kind))?;
        let settings = self.settings.get(&kind).cloned().unwrap_or_default();
        let upstream_req = provider.build_chat(&settings, req)?;
        let ctx = CallCtx {
            trace_id: trace_id.to_string(),
            upstream: provider.name(),
        };

        info!(
            event = "upstream_request",
            trace_id = %trace_id,
            provider = provider.name(),
            model = %req.model,
            method = upstream_req.method.as_str(),
            url = %upstream_req.url,
            turns = req.turns.len()
        );
        let started_at = Instant::now();
        let sent = match provider.retry_policy(&settings) {
            Some(policy) => {
                send_with_retry(self.client.as_ref(), &ctx, &upstream_req, policy).await
            }
            None => self.client.send(upstream_req).await,
        };
        let response = match sent {
            Ok(response) => response,
            Err(failure) => {
                warn!(
                    event = "upstream_response",
                    trace_id = %trace_id,
                    provider = provider.name(),
                    error = %failure,
                    elapsed_ms = started_at.elapsed().as_millis()
                );
                return Err(failure.into());
            }
        };

        info!(
            event = "upstream_response",
            trace_id = %trace_id,
            provider = provider.name(),
            status = response.status,
            elapsed_ms = started_at.elapsed().as_millis()
        );
        if !response.is_success() {
            return Err(UpstreamFailure::from_response(response).into());
        }
        Ok(provider.parse_chat(&response.body)?)
    }
}

fn model_defaults(
    registry: &ProviderRegistry,
    settings: &HashMap<ProviderKind, ProviderSettings>,
) -> ModelDefaults {
    let mut defaults = ModelDefaults::new();
    for kind in registry.kinds() {
        let configured = settings
            .get(&kind)
            .and_then(|settings| settings.model.as_deref())
            .map(str::trim)
            .filter(|model| !model.is_empty())
            .map(str::to_string);
        let model = configured.or_else(|| {
            registry
                .get(kind)
                .map(|provider| provider.default_model().to_string())
        });
        if let Some(model) = model {
            defaults = defaults.with(kind, model);
        }
    }
    defaults
}
