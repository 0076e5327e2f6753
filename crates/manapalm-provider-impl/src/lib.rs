//! Built-in upstream provider implementations.
//!
//! This crate does not perform network IO. It builds `UpstreamHttpRequest` for
//! upstream calls and decodes their bodies.

mod auth_extractor;
mod providers;
mod registry;

pub use providers::google::GoogleProvider;
pub use providers::openai::OpenAIProvider;
pub use providers::openrouter::OpenRouterProvider;
pub use registry::{build_registry, register_builtin_providers};
