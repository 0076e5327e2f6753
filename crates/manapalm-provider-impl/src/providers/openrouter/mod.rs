use bytes::Bytes;

use manapalm_provider_core::{
    ChatRequest, ProviderKind, ProviderResult, ProviderSettings, RetryPolicy,
    UpstreamHttpRequest, UpstreamProvider,
};

use crate::auth_extractor;
use crate::providers::chat_completions;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api";
const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-exp:free";
const SITE_URL: &str = "https://nakhlestanmana.com";
const SITE_TITLE: &str = "Nakhlestan Mana";

/// Free-tier default, catch-all for unknown provider names and the fallback target.
///
/// Free models on OpenRouter rate-limit aggressively, so this is the one adapter
/// whose call is retry-wrapped.
#[derive(Debug, Default)]
pub struct OpenRouterProvider;

impl OpenRouterProvider {
    pub fn new() -> Self {
        Self
    }
}

impl UpstreamProvider for OpenRouterProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    fn retry_policy(&self, settings: &ProviderSettings) -> Option<RetryPolicy> {
        Some(RetryPolicy {
            max_retries: settings.max_retries,
        })
    }

    fn build_chat(
        &self,
        settings: &ProviderSettings,
        req: &ChatRequest,
    ) -> ProviderResult<UpstreamHttpRequest> {
        let mut request = chat_completions::build_request(
            self.kind(),
            settings,
            DEFAULT_BASE_URL,
            chat_completions::CHAT_COMPLETIONS_PATH,
            req,
        )?;
        // App attribution for openrouter.ai rankings.
        auth_extractor::set_header(&mut request.headers, "HTTP-Referer", SITE_URL);
        auth_extractor::set_header(&mut request.headers, "X-Title", SITE_TITLE);
        Ok(request)
    }

    fn parse_chat(&self, body: &Bytes) -> ProviderResult<String> {
        chat_completions::parse_response(body)
    }
}
