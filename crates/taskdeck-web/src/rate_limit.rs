//! Per-client request rate limiting.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

pub type ClientLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// A limiter allowing `requests` per minute to each client, or `None` when
/// `requests` is zero.
pub fn per_minute(requests: u32) -> Option<Arc<ClientLimiter>> {
    NonZeroU32::new(requests).map(|n| Arc::new(RateLimiter::keyed(Quota::per_minute(n))))
}

/// Rejects requests over the client's budget with 429.
///
/// Clients are keyed by peer address. Requests without connection info
/// (in-process callers) all share one budget.
pub async fn limit_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.rate_limiter {
        let client = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        if limiter.check_key(&client).is_err() {
            debug!(%client, "Rate limit exceeded");
            return Err(ApiError::new(StatusCode::TOO_MANY_REQUESTS, "too many requests"));
        }
    }
    Ok(next.run(request).await)
}

/// Periodically forget clients whose budget has fully refilled.
pub async fn prune(limiter: Arc<ClientLimiter>, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        limiter.retain_recent();
        limiter.shrink_to_fit();
    }
}
