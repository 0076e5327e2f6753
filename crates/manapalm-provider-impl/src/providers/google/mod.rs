use bytes::Bytes;

use manapalm_protocol::gemini::generate_content::{
    Content, ContentRole, GenerateContentPath, GenerateContentRequest,
    GenerateContentRequestBody, GenerateContentResponse, GenerationConfig, Part,
};
use manapalm_provider_core::{
    ChatRequest, ChatTurn, HttpMethod, ProviderError, ProviderKind, ProviderResult,
    ProviderSettings, TurnRole, UpstreamHttpRequest, UpstreamProvider,
};

use crate::auth_extractor;
use crate::providers::build_url;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini `generateContent`, shaped like a chat session: every turn but the last
/// is history, the last is the message being sent (always as the user).
///
/// The system instruction is not forwarded; the chat-session shape has no slot
/// for it.
#[derive(Debug, Default)]
pub struct GoogleProvider;

impl GoogleProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_request(&self, req: &ChatRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = Vec::with_capacity(req.turns.len());
        if let Some((message, history)) = req.turns.split_last() {
            contents.extend(history.iter().map(history_content));
            contents.push(Content {
                role: Some(ContentRole::User),
                parts: vec![Part::text(message.text.clone())],
            });
        }

        GenerateContentRequest {
            path: GenerateContentPath {
                model: req.model.clone(),
            },
            body: GenerateContentRequestBody {
                contents,
                system_instruction: None,
                generation_config: Some(GenerationConfig {
                    temperature: Some(req.temperature()),
                    max_output_tokens: None,
                }),
            },
        }
    }
}

fn history_content(turn: &ChatTurn) -> Content {
    Content {
        role: Some(match turn.role {
            TurnRole::Model => ContentRole::Model,
            TurnRole::User => ContentRole::User,
        }),
        parts: vec![Part::text(turn.text.clone())],
    }
}

/// `models/<id>` for the URL path. The id is caller-supplied and must stay a
/// single path segment.
fn model_path(model: &str) -> ProviderResult<String> {
    let id = model.strip_prefix("models/").unwrap_or(model);
    let single_segment = !id.is_empty()
        && !id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_whitespace());
    if !single_segment {
        return Err(ProviderError::InvalidModel(model.to_string()));
    }
    Ok(format!("models/{id}"))
}

impl UpstreamProvider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    fn build_chat(
        &self,
        settings: &ProviderSettings,
        req: &ChatRequest,
    ) -> ProviderResult<UpstreamHttpRequest> {
        let api_key = settings.api_key(self.kind())?;
        let request = self.generate_request(req);
        let path = format!("/v1beta/{}:generateContent", model_path(&request.path.model)?);
        let body = serde_json::to_vec(&request.body)
            .map_err(|err| ProviderError::Encode(err.to_string()))?;

        let mut headers = auth_extractor::json_headers();
        auth_extractor::set_header(&mut headers, "x-goog-api-key", api_key);
        Ok(UpstreamHttpRequest {
            method: HttpMethod::Post,
            url: build_url(settings.base_url(DEFAULT_BASE_URL), &path),
            headers,
            body: Some(Bytes::from(body)),
        })
    }

    fn parse_chat(&self, body: &Bytes) -> ProviderResult<String> {
        let response: GenerateContentResponse =
            serde_json::from_slice(body).map_err(|err| ProviderError::Decode(err.to_string()))?;
        Ok(response.first_text())
    }
}
