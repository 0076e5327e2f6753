#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;

use manapalm_core::{IdentityError, IdentityProvider, ProxyEngine, UpstreamClient};
use manapalm_protocol::supabase::ProfileRow;
use manapalm_provider_core::{
    Headers, ProviderKind, ProviderSettings, UpstreamFailure, UpstreamHttpRequest,
    UpstreamHttpResponse, UpstreamTransportErrorKind,
};
use manapalm_provider_impl::build_registry;

pub const OPENAI_HOST: &str = "api.openai.com";
pub const GOOGLE_HOST: &str = "generativelanguage.googleapis.com";
pub const OPENROUTER_HOST: &str = "openrouter.ai";
pub const SUPABASE_URL: &str = "https://project.supabase.co";

#[derive(Debug, Clone)]
pub enum Outcome {
    Status(u16, String),
    Transport,
}

impl Outcome {
    pub fn ok(body: impl Into<String>) -> Self {
        Outcome::Status(200, body.into())
    }

    pub fn status(status: u16) -> Self {
        Outcome::Status(status, format!(r#"{{"error":{{"code":{status}}}}}"#))
    }
}

pub fn chat_completion(text: &str) -> Outcome {
    Outcome::ok(
        serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}}]
        })
        .to_string(),
    )
}

pub fn gemini_reply(text: &str) -> Outcome {
    Outcome::ok(
        serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
        .to_string(),
    )
}

#[derive(Debug, Clone)]
pub struct Call {
    pub at: Instant,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl Call {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(self.body.as_ref().expect("request body")).expect("json body")
    }
}

/// Answers by URL fragment. Each route plays its outcomes in order and keeps
/// repeating the last one; unmatched URLs fail with a transport error.
#[derive(Default)]
pub struct ScriptedClient {
    routes: Mutex<Vec<(String, VecDeque<Outcome>)>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, fragment: &str, outcomes: Vec<Outcome>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push((fragment.to_string(), outcomes.into()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, fragment: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.url.contains(fragment))
            .collect()
    }

    fn next_outcome(&self, url: &str) -> Outcome {
        let mut routes = self.routes.lock().unwrap();
        let Some((_, outcomes)) = routes
            .iter_mut()
            .find(|(fragment, _)| url.contains(fragment.as_str()))
        else {
            return Outcome::Transport;
        };
        if outcomes.len() > 1 {
            outcomes.pop_front().unwrap()
        } else {
            outcomes.front().cloned().unwrap_or(Outcome::Transport)
        }
    }
}

impl UpstreamClient for ScriptedClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            self.calls.lock().unwrap().push(Call {
                at: Instant::now(),
                url: req.url.clone(),
                headers: req.headers.clone(),
                body: req.body.clone(),
            });
            match self.next_outcome(&req.url) {
                Outcome::Status(status, body) => Ok(UpstreamHttpResponse {
                    status,
                    headers: vec![("content-type".to_string(), "application/json".to_string())],
                    body: Bytes::from(body),
                }),
                Outcome::Transport => Err(UpstreamFailure::Transport {
                    kind: UpstreamTransportErrorKind::Connect,
                    message: "connection refused".to_string(),
                }),
            }
        })
    }
}

pub fn all_settings(max_retries: u32) -> HashMap<ProviderKind, ProviderSettings> {
    ProviderKind::ALL
        .into_iter()
        .map(|kind| {
            (
                kind,
                ProviderSettings {
                    api_key: Some(format!("{kind}-key")),
                    base_url: None,
                    model: None,
                    max_retries,
                },
            )
        })
        .collect()
}

pub fn engine(client: Arc<ScriptedClient>) -> ProxyEngine {
    ProxyEngine::new(client, Arc::new(build_registry()), all_settings(2), None)
}

/// In-memory identity directory.
#[derive(Default)]
pub struct StubIdentity {
    pub users: HashMap<String, String>,
    pub profiles: HashMap<String, ProfileRow>,
    pub fail_profiles: bool,
    pub lookups: Mutex<u32>,
}

impl StubIdentity {
    pub fn with_user(mut self, token: &str, user_id: &str, profile: serde_json::Value) -> Self {
        self.users.insert(token.to_string(), user_id.to_string());
        self.profiles.insert(
            user_id.to_string(),
            serde_json::from_value(profile).expect("profile row"),
        );
        self
    }

    pub fn lookups(&self) -> u32 {
        *self.lookups.lock().unwrap()
    }
}

#[async_trait]
impl IdentityProvider for StubIdentity {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn user_id(&self, token: &str) -> Result<String, IdentityError> {
        *self.lookups.lock().unwrap() += 1;
        self.users.get(token).cloned().ok_or_else(|| {
            IdentityError::Upstream(UpstreamFailure::Http {
                status: 401,
                headers: Vec::new(),
                body: Bytes::from_static(b"invalid JWT"),
            })
        })
    }

    async fn profile(&self, user_id: &str) -> Result<ProfileRow, IdentityError> {
        if self.fail_profiles {
            return Err(IdentityError::Decode("profiles unavailable".to_string()));
        }
        self.profiles
            .get(user_id)
            .cloned()
            .ok_or_else(|| IdentityError::ProfileNotFound(user_id.to_string()))
    }
}
