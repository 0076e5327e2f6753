use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::BytesRejection;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, ORIGIN};
use tracing::{info, warn};
use uuid::Uuid;

use manapalm_protocol::downstream::{ProxyRequestBody, ProxyResponseBody};
use manapalm_provider_core::ChatRequest;

use crate::core::{CoreState, REQUEST_ID_HEADER};
use crate::error::ProxyError;
use crate::identity::{anonymous_id, bearer_token};
use crate::selector::select;

pub async fn proxy_handler(
    State(state): State<Arc<CoreState>>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let origin = headers
        .get(ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let mut response = if method == Method::POST {
        match body {
            Ok(body) => generate(&state, &headers, body, &trace_id).await,
            Err(rejection) => {
                warn!(
                    event = "downstream_responded",
                    trace_id = %trace_id,
                    status = rejection.status().as_u16(),
                    error = %rejection.body_text()
                );
                error_response(ProxyError::unreadable_body(
                    rejection.status(),
                    rejection.body_text(),
                ))
            }
        }
    } else if method == Method::OPTIONS {
        empty_response(StatusCode::OK)
    } else {
        error_response(ProxyError::method_not_allowed())
    };

    state.cors.apply(origin.as_deref(), response.headers_mut());
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn generate(state: &CoreState, headers: &HeaderMap, body: Bytes, trace_id: &str) -> Response {
    let started_at = Instant::now();
    let request: ProxyRequestBody = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                status = StatusCode::BAD_REQUEST.as_u16(),
                error = %err,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            return error_response(ProxyError::bad_request(format!("invalid request body: {err}")));
        }
    };

    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        action = ?request.action,
        provider = ?request.provider,
        model = ?request.model,
        turns = request.contents().len()
    );

    let token = bearer_token(headers);
    let anonymous = anonymous_id(headers);
    let quota = state
        .quota
        .resolve(token.as_deref(), anonymous.as_deref(), trace_id)
        .await;

    let selection = select(
        request.provider.as_deref(),
        request.model.as_deref(),
        quota.tier,
        state.engine.model_defaults(),
    );
    let chat = ChatRequest::from_contents(
        selection.model.clone(),
        request.contents(),
        request.config(),
    );

    match state
        .engine
        .generate_with_fallback(trace_id, &selection, &chat)
        .await
    {
        Ok(generation) => {
            let envelope = ProxyResponseBody {
                text: generation.text.clone(),
                provider: generation.provider_label(),
                tier: quota.tier,
                remaining_seconds: quota.remaining_seconds,
            };
            info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                status = StatusCode::OK.as_u16(),
                provider = %envelope.provider,
                model = %generation.model,
                tier = %quota.tier,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            json_response(StatusCode::OK, &envelope)
        }
        Err(err) => {
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                provider = selection.provider.as_str(),
                error = %err,
                elapsed_ms = started_at.elapsed().as_millis()
            );
            error_response(ProxyError::generation_failed(err.to_string()))
        }
    }
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            let mut resp = Response::new(Body::from(bytes));
            *resp.status_mut() = status;
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            resp
        }
        Err(err) => error_response(ProxyError::generation_failed(err.to_string())),
    }
}

fn error_response(err: ProxyError) -> Response {
    let mut resp = Response::new(Body::from(err.body_bytes()));
    *resp.status_mut() = err.status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn empty_response(status: StatusCode) -> Response {
    let mut resp = Response::new(Body::empty());
    *resp.status_mut() = status;
    resp
}
