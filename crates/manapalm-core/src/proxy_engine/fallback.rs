use tracing::warn;

use manapalm_provider_core::{ChatRequest, ProviderKind};

use super::{EngineError, ProxyEngine};
use crate::selector::Selection;

pub const FALLBACK_SUFFIX: &str = " (fallback)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Primary,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub attempt: Attempt,
}

impl Generation {
    /// Provider name as reported to the caller, e.g. `openrouter (fallback)`.
    pub fn provider_label(&self) -> String {
        match self.attempt {
            Attempt::Primary => self.provider.as_str().to_string(),
            Attempt::Fallback => format!("{}{FALLBACK_SUFFIX}", self.provider),
        }
    }
}

impl ProxyEngine {
    /// One primary attempt, then at most one attempt against the fallback pair.
    ///
    /// There is no second chance when the primary already is the fallback
    /// provider; its error goes straight back to the caller.
    pub async fn generate_with_fallback(
        &self,
        trace_id: &str,
        primary: &Selection,
        req: &ChatRequest,
    ) -> Result<Generation, EngineError> {
        let primary_err = match self
            .generate(trace_id, primary.provider, &req.with_model(&primary.model))
            .await
        {
            Ok(text) => {
                return Ok(Generation {
                    text,
                    provider: primary.provider,
                    model: primary.model.clone(),
                    attempt: Attempt::Primary,
                });
            }
            Err(err) => err,
        };

        let fallback = self.fallback().clone();
        if primary.provider == fallback.provider {
            return Err(primary_err);
        }

        warn!(
            event = "fallback_attempt",
            trace_id = %trace_id,
            failed_provider = primary.provider.as_str(),
            failed_model = %primary.model,
            error = %primary_err,
            provider = fallback.provider.as_str(),
            model = %fallback.model
        );
        let text = self
            .generate(trace_id, fallback.provider, &req.with_model(&fallback.model))
            .await?;
        Ok(Generation {
            text,
            provider: fallback.provider,
            model: fallback.model,
            attempt: Attempt::Fallback,
        })
    }
}
