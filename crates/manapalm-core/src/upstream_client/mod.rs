use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use wreq::{Client, Method, Proxy};

use manapalm_common::GlobalConfig;
use manapalm_provider_core::{
    Headers, HttpMethod, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
    UpstreamTransportErrorKind,
};

mod retry;

pub use retry::{BASE_BACKOFF_MS, backoff_delay, send_with_retry};

/// One outbound HTTP exchange. Non-2xx statuses are returned as responses;
/// only transport failures are errors.
pub trait UpstreamClient: Send + Sync {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>;
}

/// Per-call logging context.
#[derive(Debug, Clone)]
pub struct CallCtx {
    pub trace_id: String,
    /// Provider name or identity backend, for logs only.
    pub upstream: &'static str,
}

#[derive(Debug, Clone)]
pub struct UpstreamClientConfig {
    pub proxy: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl UpstreamClientConfig {
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            proxy: global.proxy.clone(),
            ..Self::default()
        }
    }
}

impl Default for UpstreamClientConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
        }
    }
}

/// `wreq`-backed client shared by the provider engine and the identity lookups.
#[derive(Clone)]
pub struct WreqUpstreamClient {
    client: Client,
}

impl WreqUpstreamClient {
    pub fn new(config: UpstreamClientConfig) -> Result<Self, wreq::Error> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);
        let proxy = config
            .proxy
            .as_deref()
            .map(str::trim)
            .filter(|proxy| !proxy.is_empty());
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl UpstreamClient for WreqUpstreamClient {
    fn send<'a>(
        &'a self,
        req: UpstreamHttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<UpstreamHttpResponse, UpstreamFailure>> + Send + 'a>>
    {
        Box::pin(async move {
            let method = match req.method {
                HttpMethod::Get => Method::GET,
                HttpMethod::Post => Method::POST,
            };
            let mut request = self.client.request(method, &req.url);
            for (name, value) in &req.headers {
                request = request.header(name, value);
            }
            if let Some(body) = req.body {
                request = request.body(body);
            }

            let response = request.send().await.map_err(transport_failure)?;
            let status = response.status().as_u16();
            let headers: Headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(transport_failure)?;
            Ok(UpstreamHttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

fn transport_failure(err: wreq::Error) -> UpstreamFailure {
    let message = err.to_string();
    let kind = transport_kind(
        err.is_timeout(),
        err.is_connect(),
        &message.to_ascii_lowercase(),
    );
    UpstreamFailure::Transport { kind, message }
}

fn transport_kind(timeout: bool, connect: bool, message: &str) -> UpstreamTransportErrorKind {
    let mentions = |needles: &[&str]| needles.iter().any(|needle| message.contains(needle));
    match (timeout, connect) {
        (true, _) if mentions(&["read", "idle"]) => UpstreamTransportErrorKind::ReadTimeout,
        (true, _) => UpstreamTransportErrorKind::Timeout,
        (false, true) if mentions(&["dns", "resolve"]) => UpstreamTransportErrorKind::Dns,
        _ if mentions(&["tls", "ssl", "certificate"]) => UpstreamTransportErrorKind::Tls,
        (false, true) => UpstreamTransportErrorKind::Connect,
        _ => UpstreamTransportErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kinds() {
        use UpstreamTransportErrorKind::*;
        assert_eq!(transport_kind(true, false, "operation timed out"), Timeout);
        assert_eq!(transport_kind(true, false, "idle read timed out"), ReadTimeout);
        assert_eq!(transport_kind(false, true, "dns error: failed to resolve"), Dns);
        assert_eq!(transport_kind(false, true, "tls handshake eof"), Tls);
        assert_eq!(transport_kind(false, true, "connection refused"), Connect);
        assert_eq!(transport_kind(false, false, "body closed"), Other);
    }
}
