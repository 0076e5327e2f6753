use bytes::Bytes;

use manapalm_provider_core::{
    ChatRequest, ProviderKind, ProviderResult, ProviderSettings, UpstreamHttpRequest,
    UpstreamProvider,
};

use crate::providers::chat_completions;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Premium-tier default. One attempt per call; failures go to the fallback.
#[derive(Debug, Default)]
pub struct OpenAIProvider;

impl OpenAIProvider {
    pub fn new() -> Self {
        Self
    }
}

impl UpstreamProvider for OpenAIProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    fn build_chat(
        &self,
        settings: &ProviderSettings,
        req: &ChatRequest,
    ) -> ProviderResult<UpstreamHttpRequest> {
        chat_completions::build_request(
            self.kind(),
            settings,
            DEFAULT_BASE_URL,
            chat_completions::CHAT_COMPLETIONS_PATH,
            req,
        )
    }

    fn parse_chat(&self, body: &Bytes) -> ProviderResult<String> {
        chat_completions::parse_response(body)
    }
}
