use std::time::Duration;

use tracing::warn;

use manapalm_provider_core::{
    RetryPolicy, UpstreamFailure, UpstreamHttpRequest, UpstreamHttpResponse,
};

use super::{CallCtx, UpstreamClient};

pub const BASE_BACKOFF_MS: u64 = 1000;

const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Delay before attempt `attempt` (attempt 0 is the first call and never waits):
/// `1000 * 2^attempt` ms, i.e. 2s, 4s, 8s...
pub fn backoff_delay(attempt: u32) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }
    let factor = 2u64.saturating_pow(attempt);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor))
}

/// Sends `req`, retrying on 429 and transport failures up to `policy.max_retries`
/// extra attempts.
///
/// Any other status returns immediately. When retries run out the last 429 is
/// returned as a response and the last transport failure as an error.
pub async fn send_with_retry(
    client: &dyn UpstreamClient,
    ctx: &CallCtx,
    req: &UpstreamHttpRequest,
    policy: RetryPolicy,
) -> Result<UpstreamHttpResponse, UpstreamFailure> {
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            tokio::time::sleep(backoff_delay(attempt)).await;
        }
        let retries_left = attempt < policy.max_retries;

        match client.send(req.clone()).await {
            Ok(response) if response.status == STATUS_TOO_MANY_REQUESTS && retries_left => {
                warn!(
                    event = "upstream_retry",
                    trace_id = %ctx.trace_id,
                    upstream = ctx.upstream,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    status = response.status,
                    delay_ms = backoff_delay(attempt + 1).as_millis() as u64
                );
            }
            Ok(response) => return Ok(response),
            Err(failure) if retries_left => {
                warn!(
                    event = "upstream_retry",
                    trace_id = %ctx.trace_id,
                    upstream = ctx.upstream,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    error = %failure,
                    delay_ms = backoff_delay(attempt + 1).as_millis() as u64
                );
            }
            Err(failure) => return Err(failure),
        }
        attempt += 1;
    }
}
