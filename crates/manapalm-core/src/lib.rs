pub mod bootstrap;
pub mod core;
pub mod cors;
pub mod error;
pub mod handler;
pub mod identity;
pub mod proxy_engine;
pub mod selector;
pub mod upstream_client;

pub use core::{Core, CoreState, MAX_BODY_BYTES, REQUEST_ID_HEADER};
pub use cors::CorsConfig;
pub use error::ProxyError;
pub use identity::{
    CallerQuota, DisabledIdentity, IdentityError, IdentityProvider, QuotaResolver,
    SupabaseIdentity,
};
pub use proxy_engine::{Attempt, EngineError, Generation, ProxyEngine};
pub use selector::{ModelDefaults, Selection};
pub use upstream_client::{CallCtx, UpstreamClient, UpstreamClientConfig, WreqUpstreamClient};
