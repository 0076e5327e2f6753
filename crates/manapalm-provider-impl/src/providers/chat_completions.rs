//! Flat message-list dialect shared by OpenAI and OpenRouter.

use bytes::Bytes;

use manapalm_protocol::openai::create_chat_completions::{
    ChatCompletionMessage, ChatCompletionRole, CreateChatCompletionRequestBody,
    CreateChatCompletionResponse,
};
use manapalm_provider_core::{
    ChatRequest, HttpMethod, ProviderError, ProviderKind, ProviderResult, ProviderSettings,
    TurnRole, UpstreamHttpRequest,
};

use crate::auth_extractor;
use crate::providers::build_url;

pub(crate) const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// System instruction first, then the turns with `model` mapped to `assistant`.
pub(crate) fn messages(req: &ChatRequest) -> Vec<ChatCompletionMessage> {
    let mut messages = Vec::with_capacity(req.turns.len() + 1);
    if let Some(system) = req.system_instruction.as_deref() {
        messages.push(ChatCompletionMessage {
            role: ChatCompletionRole::System,
            content: system.to_string(),
        });
    }
    messages.extend(req.turns.iter().map(|turn| ChatCompletionMessage {
        role: match turn.role {
            TurnRole::Model => ChatCompletionRole::Assistant,
            TurnRole::User => ChatCompletionRole::User,
        },
        content: turn.text.clone(),
    }));
    messages
}

pub(crate) fn build_request(
    kind: ProviderKind,
    settings: &ProviderSettings,
    default_base: &str,
    path: &str,
    req: &ChatRequest,
) -> ProviderResult<UpstreamHttpRequest> {
    let api_key = settings.api_key(kind)?;
    let body = CreateChatCompletionRequestBody {
        model: req.model.clone(),
        messages: messages(req),
        temperature: Some(req.temperature()),
    };
    let body = serde_json::to_vec(&body).map_err(|err| ProviderError::Encode(err.to_string()))?;

    let mut headers = auth_extractor::json_headers();
    auth_extractor::set_bearer(&mut headers, api_key);
    Ok(UpstreamHttpRequest {
        method: HttpMethod::Post,
        url: build_url(settings.base_url(default_base), path),
        headers,
        body: Some(Bytes::from(body)),
    })
}

pub(crate) fn parse_response(body: &Bytes) -> ProviderResult<String> {
    let response: CreateChatCompletionResponse =
        serde_json::from_slice(body).map_err(|err| ProviderError::Decode(err.to_string()))?;
    Ok(response.first_text())
}
