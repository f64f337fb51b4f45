//! Resource limiting for protecting system capacity.
//!
//! This module provides a per-client fixed-window rate limiter. Clients are keyed by the peer
//! address; behind a trusted reverse proxy (`trust_forwarded_for`) the rightmost
//! `X-Forwarded-For` entry is used instead. Responses carry the standard
//! `RateLimit-Limit`, `RateLimit-Remaining` and `RateLimit-Reset` headers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::{LimitsConfig, RateLimitConfig};
use crate::errors::Error;

/// Tracked clients above which expired windows are swept on the next request
const SWEEP_THRESHOLD: usize = 10_000;

const RATELIMIT_LIMIT: &str = "ratelimit-limit";
const RATELIMIT_REMAINING: &str = "ratelimit-remaining";
const RATELIMIT_RESET: &str = "ratelimit-reset";

/// Container for all resource limiters.
///
/// This struct holds all the individual limiters used by the application.
#[derive(Debug, Default, Clone)]
pub struct Limiters {
    /// Per-client request limiter for the public API. None means unlimited.
    pub requests: Option<Arc<RateLimiter>>,
}

impl Limiters {
    /// Creates all limiters from configuration.
    pub fn new(config: &LimitsConfig) -> Self {
        Self {
            requests: RateLimiter::new(&config.rate_limit).map(Arc::new),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request against a client's window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the client's window resets
    pub reset_after: Duration,
}

/// Fixed-window request counter keyed by client.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    trust_forwarded_for: bool,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    /// Creates a limiter from configuration.
    ///
    /// If `max_requests` is 0, returns `None` (unlimited).
    pub fn new(config: &RateLimitConfig) -> Option<Self> {
        if config.max_requests == 0 {
            return None;
        }

        Some(Self {
            max_requests: config.max_requests,
            window: config.window,
            trust_forwarded_for: config.trust_forwarded_for,
            windows: DashMap::new(),
        })
    }

    /// Count a request from `client` now.
    pub fn check(&self, client: &str) -> RateLimitStatus {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> RateLimitStatus {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.sweep(now);
        }

        let mut entry = self.windows.entry(client.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        let allowed = entry.count < self.max_requests;
        if allowed {
            entry.count += 1;
        }

        RateLimitStatus {
            allowed,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(now.duration_since(entry.started)),
        }
    }

    /// Drop windows that have already expired.
    fn sweep(&self, now: Instant) {
        let before = self.windows.len();
        self.windows.retain(|_, w| now.duration_since(w.started) < self.window);
        tracing::debug!("Rate limiter swept {} expired client windows", before - self.windows.len());
    }
}

/// Identify the client a request counts against.
///
/// Entries left of the last `X-Forwarded-For` hop are client-supplied, so only the rightmost one
/// (appended by our proxy) is used, and only when `trust_forwarded_for` is set.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware enforcing the request limiter. Pass-through when rate limiting is disabled.
pub async fn rate_limit_middleware(State(limiters): State<Limiters>, request: Request, next: Next) -> Response {
    let Some(limiter) = limiters.requests.as_ref() else {
        return next.run(request).await;
    };

    let peer = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
    let client = client_key(request.headers(), peer, limiter.trust_forwarded_for);
    let status = limiter.check(&client);

    let mut response = if status.allowed {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Rate limit exceeded");
        Error::TooManyRequests {
            message: "Too many requests, please try again later.".to_string(),
        }
        .into_response()
    };

    let headers = response.headers_mut();
    headers.insert(RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(status.reset_after.as_secs()));
    response
}
