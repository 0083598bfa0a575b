//! Per-IP fixed-window request limiting.

use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config;

/// Tracks request counts per client IP.
pub struct RateLimiter {
    /// IP -> (request count, window start)
    entries: Arc<RwLock<HashMap<IpAddr, RateLimitEntry>>>,
    max_requests: u32,
    window: Duration,
}

#[derive(Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the caller's current window closes.
    pub reset_after: Duration,
}

impl RateLimiter {
    pub fn new(max_requests_per_ip: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_requests: max_requests_per_ip,
            window,
        }
    }

    pub fn from_config(cfg: &config::RateLimit) -> Self {
        Self::new(cfg.max_requests, Duration::from_secs(cfg.window_seconds))
    }

    /// Periodically drops entries whose window has closed, until `shutdown`
    /// is cancelled.
    pub fn start_cleanup_task(&self, cleanup_interval: Duration, shutdown: CancellationToken) {
        let entries = self.entries.clone();
        let window = self.window;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_interval);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        debug!("rate limiter cleanup task shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let now = Instant::now();
                        let mut map = entries.write();
                        let before = map.len();
                        map.retain(|_, entry| now.duration_since(entry.window_start) < window);
                        let removed = before - map.len();
                        if removed > 0 {
                            debug!(removed, remaining = map.len(), "rate limit entries cleaned up");
                        }
                    }
                }
            }
        });
    }

    /// Counts a request from `ip`. Denied requests are not counted.
    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        let now = Instant::now();
        let mut map = self.entries.write();

        let entry = map.entry(ip).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        RateLimitDecision {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(now.duration_since(entry.window_start)),
        }
    }

    pub fn tracked_ips(&self) -> usize {
        self.entries.read().len()
    }
}

fn client_ip(req: &Request) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

fn set_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    let reset = decision.reset_after.as_secs_f64().ceil() as u64;
    headers.insert("ratelimit-limit", HeaderValue::from(decision.limit));
    headers.insert("ratelimit-remaining", HeaderValue::from(decision.remaining));
    headers.insert("ratelimit-reset", HeaderValue::from(reset));
    if !decision.allowed {
        headers.insert("retry-after", HeaderValue::from(reset));
    }
}

pub async fn enforce(State(limiter): State<Arc<RateLimiter>>, req: Request, next: Next) -> Response {
    let ip = client_ip(&req);
    let decision = limiter.check(ip);

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        debug!(%ip, "rate limited");
        (StatusCode::TOO_MANY_REQUESTS, "Too many requests, please try again later.").into_response()
    };

    set_headers(response.headers_mut(), &decision);
    response
}
