/// Per-IP request throttling
///
/// Each client IP gets a budget of `max_requests` per `window`, refilled
/// smoothly (GCRA) rather than all at once when the window ends. Requests
/// over budget are answered with a 429 envelope and a `Retry-After` header.
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultKeyedRateLimiter, Quota, RateLimiter,
    clock::{Clock, DefaultClock},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::ApiError;

/// Tracked IPs above which idle entries are dropped
const PRUNE_THRESHOLD: usize = 10_000;

pub type IpRateLimiter = DefaultKeyedRateLimiter<IpAddr>;

/// A request budget per client IP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub max_requests: NonZeroU32,
    pub window: Duration,
}

impl RateLimit {
    /// Returns `None` when either value is zero, which disables limiting
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let max_requests = NonZeroU32::new(max_requests)?;
        if window.is_zero() {
            return None;
        }
        Some(Self { max_requests, window })
    }

    /// The governor quota: a full burst, replenished one request per `window / max`
    fn quota(&self) -> Option<Quota> {
        Quota::with_period(self.window / self.max_requests.get()).map(|quota| quota.allow_burst(self.max_requests))
    }

    /// Builds the shared keyed limiter, or `None` if the window is too short to divide
    pub fn limiter(&self) -> Option<Arc<IpRateLimiter>> {
        self.quota().map(|quota| Arc::new(RateLimiter::keyed(quota)))
    }
}

/// The connecting IP, or the unspecified address when the server was not
/// started with connect info
fn client_ip(request: &Request) -> IpAddr {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware that charges each request to its client IP
pub async fn enforce_rate_limit(State(limiter): State<Arc<IpRateLimiter>>, request: Request, next: Next) -> Response {
    if limiter.len() > PRUNE_THRESHOLD {
        limiter.retain_recent();
    }

    let ip = client_ip(&request);
    match limiter.check_key(&ip) {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            debug!(%ip, wait_ms = wait.as_millis() as u64, "Rate limited");
            ApiError::TooManyRequests(wait.as_secs().max(1)).into_response()
        }
    }
}
