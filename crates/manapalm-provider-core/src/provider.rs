use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::chat::ChatRequest;
use crate::config::ProviderSettings;
use crate::errors::ProviderResult;
use crate::headers::Headers;

/// The closed set of upstream AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAI,
    Google,
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAI,
        ProviderKind::Google,
        ProviderKind::OpenRouter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Google => "google",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }

    /// Like [`ProviderKind::parse`], but unknown names land on openrouter.
    pub fn resolve(name: &str) -> Self {
        Self::parse(name).unwrap_or(ProviderKind::OpenRouter)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

#[derive(Debug, Clone)]
pub struct UpstreamHttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl UpstreamHttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpstreamTransportErrorKind {
    Timeout,
    ReadTimeout,
    Connect,
    Dns,
    Tls,
    Other,
}

const BODY_PREVIEW_CHARS: usize = 512;

#[derive(Debug, Clone)]
pub enum UpstreamFailure {
    /// Transport-level failures (no HTTP response).
    Transport {
        kind: UpstreamTransportErrorKind,
        message: String,
    },
    /// HTTP error response captured as bytes (non-2xx).
    Http {
        status: u16,
        headers: Headers,
        body: Bytes,
    },
}

impl UpstreamFailure {
    pub fn from_response(response: UpstreamHttpResponse) -> Self {
        UpstreamFailure::Http {
            status: response.status,
            headers: response.headers,
            body: response.body,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamFailure::Http { status, .. } => Some(*status),
            UpstreamFailure::Transport { .. } => None,
        }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamFailure::Transport { kind, message } => {
                write!(f, "upstream transport error ({kind:?}): {message}")
            }
            UpstreamFailure::Http { status, body, .. } => {
                let text = String::from_utf8_lossy(body);
                let preview: String = text.chars().take(BODY_PREVIEW_CHARS).collect();
                if preview.trim().is_empty() {
                    write!(f, "upstream returned HTTP {status}")
                } else {
                    write!(f, "upstream returned HTTP {status}: {}", preview.trim())
                }
            }
        }
    }
}

impl std::error::Error for UpstreamFailure {}

/// Bounded retry around one upstream call; see the engine for the backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
}

pub trait UpstreamProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Model used when neither the caller nor the config names one.
    fn default_model(&self) -> &'static str;

    /// `None` means a single unwrapped attempt.
    fn retry_policy(&self, _settings: &ProviderSettings) -> Option<RetryPolicy> {
        None
    }

    fn build_chat(
        &self,
        settings: &ProviderSettings,
        req: &ChatRequest,
    ) -> ProviderResult<UpstreamHttpRequest>;

    /// Decode a 2xx body into the generated text. No completions is `Ok("")`.
    fn parse_chat(&self, body: &Bytes) -> ProviderResult<String>;
}
