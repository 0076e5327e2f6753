use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::any;

use crate::cors::CorsConfig;
use crate::handler::proxy_handler;
use crate::identity::QuotaResolver;
use crate::proxy_engine::ProxyEngine;

pub const PROXY_ROUTE: &str = "/api/proxy";
pub const REQUEST_ID_HEADER: &str = "x-manapalm-request-id";
/// Conversations may carry inline base64 images.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub struct CoreState {
    pub engine: ProxyEngine,
    pub quota: QuotaResolver,
    pub cors: CorsConfig,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(engine: ProxyEngine, quota: QuotaResolver, cors: CorsConfig) -> Self {
        Self {
            state: Arc::new(CoreState {
                engine,
                quota,
                cors,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(PROXY_ROUTE, any(proxy_handler))
            .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
            .with_state(self.state.clone())
    }

    pub fn state(&self) -> Arc<CoreState> {
        self.state.clone()
    }
}
