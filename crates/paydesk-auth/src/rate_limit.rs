//! Abuse guard
//!
//! Sliding-window request counting per `(bucket, client)` pair. The guard
//! only answers yes or no; turning a refusal into a 429 is the caller's job.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderMap;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::config::{BucketLimit, RateLimitConfig};

/// Independent counters kept per client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateBucket {
    /// Login and registration
    Auth,
    /// Payment and transfer creation
    PaymentCreate,
    /// Everything else behind authentication
    General,
}

impl RateBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::PaymentCreate => "payment-create",
            Self::General => "general",
        }
    }
}

impl fmt::Display for RateBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request timestamps still inside the window
#[derive(Debug, Clone, Default)]
struct Window {
    requests: Vec<Instant>,
}

impl Window {
    fn prune(&mut self, now: Instant, window: Duration) {
        self.requests.retain(|&t| now.duration_since(t) < window);
    }
}

/// Per-client rate limiter shared by every request handler
#[derive(Clone)]
pub struct AbuseGuard {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<(RateBucket, String), Window>>>,
}

impl AbuseGuard {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn limit_for(&self, bucket: RateBucket) -> BucketLimit {
        match bucket {
            RateBucket::Auth => self.config.auth,
            RateBucket::PaymentCreate => self.config.payment_create,
            RateBucket::General => self.config.general,
        }
    }

    /// Count the request and report whether it fits in the window.
    ///
    /// Refused requests are not counted.
    pub async fn admit(&self, client: &str, bucket: RateBucket) -> bool {
        if !self.config.enabled {
            return true;
        }

        let BucketLimit { limit, window } = self.limit_for(bucket);
        let now = Instant::now();

        let mut windows = self.windows.write().await;
        let entry = windows.entry((bucket, client.to_string())).or_default();
        entry.prune(now, window);

        if entry.requests.len() >= limit as usize {
            tracing::warn!(client = client, bucket = %bucket, limit, "Rate limit exceeded");
            return false;
        }

        entry.requests.push(now);
        true
    }

    /// Time until the client may be admitted again; zero when it already may
    pub async fn retry_after(&self, client: &str, bucket: RateBucket) -> Duration {
        if !self.config.enabled {
            return Duration::ZERO;
        }

        let BucketLimit { limit, window } = self.limit_for(bucket);
        let now = Instant::now();

        let windows = self.windows.read().await;
        let Some(entry) = windows.get(&(bucket, client.to_string())) else {
            return Duration::ZERO;
        };

        let live: Vec<Instant> = entry
            .requests
            .iter()
            .copied()
            .filter(|&t| now.duration_since(t) < window)
            .collect();

        if live.len() < limit as usize {
            return Duration::ZERO;
        }

        // The slot frees up once enough of the oldest requests age out
        let freeing = live[live.len() - limit as usize];
        window.saturating_sub(now.duration_since(freeing))
    }

    /// Drop windows with no request left inside them
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let before = windows.len();

        windows.retain(|(bucket, _), entry| {
            entry.prune(now, self.limit_for(*bucket).window);
            !entry.requests.is_empty()
        });

        let removed = before - windows.len();
        if removed > 0 {
            tracing::debug!(removed, "Dropped idle rate limit windows");
        }
    }

    /// Number of tracked `(bucket, client)` windows
    pub async fn tracked(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Derive the client key for the guard.
///
/// Proxy headers are consulted only when `trust_proxy_headers` is set;
/// otherwise the peer address is the key, so a client cannot pick its own.
pub fn extract_client_ip(
    headers: &HeaderMap,
    peer_addr: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    let peer = || peer_addr.map(|a| a.ip().to_string());

    if !trust_proxy_headers {
        return peer().unwrap_or_else(|| "unknown".to_string());
    }

    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let forwarded_for = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    // Priority: CF > X-Real-IP > X-Forwarded-For > peer addr
    header("CF-Connecting-IP")
        .or_else(|| header("X-Real-IP"))
        .or(forwarded_for)
        .or_else(peer)
        .unwrap_or_else(|| "unknown".to_string())
}
