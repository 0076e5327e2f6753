//! Core provider abstractions for the router.
//!
//! This crate intentionally does **not** depend on axum or any concrete HTTP client.
//! Provider implementations construct `UpstreamHttpRequest` and decode response
//! bodies, while a higher layer performs IO (and retries, when a provider asks).

pub mod chat;
pub mod config;
pub mod errors;
pub mod headers;
pub mod provider;
pub mod registry;

pub use chat::{ChatRequest, ChatTurn, DEFAULT_TEMPERATURE, TurnRole, part_text};
pub use config::ProviderSettings;
pub use errors::{ProviderError, ProviderResult};
pub use headers::{Headers, header_get, header_set};
pub use provider::{
    HttpMethod, ProviderKind, RetryPolicy, UpstreamFailure, UpstreamHttpRequest,
    UpstreamHttpResponse, UpstreamProvider, UpstreamTransportErrorKind,
};
pub use registry::ProviderRegistry;
