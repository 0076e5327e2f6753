mod common;

use std::sync::Arc;
use std::time::Duration;

use manapalm_core::upstream_client::send_with_retry;
use manapalm_core::{CallCtx, EngineError};
use manapalm_provider_core::{
    ChatRequest, ChatTurn, HttpMethod, ProviderKind, RetryPolicy, UpstreamFailure,
    UpstreamHttpRequest,
};

use common::{OPENROUTER_HOST, Outcome, ScriptedClient, chat_completion, engine};

fn ctx() -> CallCtx {
    CallCtx {
        trace_id: "trace-retry".to_string(),
        upstream: "openrouter",
    }
}

fn request() -> UpstreamHttpRequest {
    UpstreamHttpRequest {
        method: HttpMethod::Post,
        url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
        headers: Vec::new(),
        body: None,
    }
}

fn gaps(client: &ScriptedClient) -> Vec<Duration> {
    let calls = client.calls();
    calls
        .windows(2)
        .map(|pair| pair[1].at.duration_since(pair[0].at))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn rate_limited_twice_then_success_backs_off_two_then_four_seconds() {
    let client = ScriptedClient::new().on(
        OPENROUTER_HOST,
        vec![Outcome::status(429), Outcome::status(429), Outcome::ok("{}")],
    );

    let response = send_with_retry(&client, &ctx(), &request(), RetryPolicy { max_retries: 2 })
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(client.calls().len(), 3);
    assert_eq!(gaps(&client), vec![Duration::from_secs(2), Duration::from_secs(4)]);
}

#[tokio::test(start_paused = true)]
async fn persistent_429_returns_last_response_after_all_attempts() {
    let client = ScriptedClient::new().on(OPENROUTER_HOST, vec![Outcome::status(429)]);

    let response = send_with_retry(&client, &ctx(), &request(), RetryPolicy { max_retries: 2 })
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(client.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_retried() {
    let client = ScriptedClient::new().on(
        OPENROUTER_HOST,
        vec![Outcome::Transport, Outcome::ok("{}")],
    );

    let response = send_with_retry(&client, &ctx(), &request(), RetryPolicy { max_retries: 2 })
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(gaps(&client), vec![Duration::from_secs(2)]);
}

#[tokio::test(start_paused = true)]
async fn exhausted_transport_failures_surface_the_error() {
    let client = ScriptedClient::new().on(OPENROUTER_HOST, vec![Outcome::Transport]);

    let err = send_with_retry(&client, &ctx(), &request(), RetryPolicy { max_retries: 1 })
        .await
        .unwrap_err();

    assert!(matches!(err, UpstreamFailure::Transport { .. }));
    assert_eq!(client.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn server_errors_and_client_errors_are_not_retried() {
    for status in [400, 401, 500, 503] {
        let client = ScriptedClient::new().on(
            OPENROUTER_HOST,
            vec![Outcome::status(status), Outcome::ok("{}")],
        );
        let response =
            send_with_retry(&client, &ctx(), &request(), RetryPolicy { max_retries: 2 })
                .await
                .unwrap();
        assert_eq!(response.status, status);
        assert_eq!(client.calls().len(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn zero_retries_means_single_attempt() {
    let client = ScriptedClient::new().on(OPENROUTER_HOST, vec![Outcome::status(429)]);

    let response = send_with_retry(&client, &ctx(), &request(), RetryPolicy { max_retries: 0 })
        .await
        .unwrap();

    assert_eq!(response.status, 429);
    assert_eq!(client.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn engine_retries_openrouter_only() {
    let client = Arc::new(
        ScriptedClient::new()
            .on(OPENROUTER_HOST, vec![Outcome::status(429), chat_completion("salam")])
            .on("api.openai.com", vec![Outcome::status(429), chat_completion("never")]),
    );
    let engine = engine(client.clone());
    let req = ChatRequest::new("m", vec![ChatTurn::user("hi")]);

    let text = engine
        .generate("t1", ProviderKind::OpenRouter, &req)
        .await
        .unwrap();
    assert_eq!(text, "salam");
    assert_eq!(client.calls_to(OPENROUTER_HOST).len(), 2);

    let err = engine
        .generate("t2", ProviderKind::OpenAI, &req)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Upstream(UpstreamFailure::Http { status: 429, .. })
    ));
    assert_eq!(client.calls_to("api.openai.com").len(), 1);
}
