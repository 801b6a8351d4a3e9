// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding window rate limiter.
//!
//! Each identifier keeps the timestamps of its admitted requests inside the
//! trailing window. A request is admitted while fewer than `max_requests`
//! timestamps remain after pruning. Rejected requests are not recorded.
//!
//! State is process-local: two processes never share a budget.

use crate::clock::{Clock, SystemClock};
use crate::config::LimitConfig;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Default budget: 10 requests per identifier.
pub const DEFAULT_MAX_REQUESTS: u32 = 10;

/// Default trailing window: one minute.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until the oldest admitted request leaves the window
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until a slot frees up
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Thread-safe sliding window rate limiter.
pub struct RateLimiter {
    max_requests: u32,
    window_ms: u64,
    clock: Arc<dyn Clock>,
    /// Admitted request timestamps per identifier, oldest first
    requests: Arc<RwLock<HashMap<String, VecDeque<u64>>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Create a limiter driven by the wall clock.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self::with_clock(max_requests, window, Arc::new(SystemClock))
    }

    /// Create a limiter driven by the given clock.
    pub fn with_clock(max_requests: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window_ms: window.as_millis() as u64,
            clock,
            requests: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &LimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(config.max_requests, config.window(), clock)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Check and, when admitted, record a request for `identifier`.
    pub async fn check(&self, identifier: &str) -> RateLimitResult {
        let now = self.clock.now_ms();
        let mut requests = self.requests.write().await;
        let timestamps = requests.entry(identifier.to_string()).or_default();

        prune(timestamps, now, self.window_ms);

        if timestamps.len() >= self.max_requests as usize {
            let retry_after = self.until_oldest_expires(timestamps, now);
            debug!(identifier, ?retry_after, "Rate limit exceeded");
            return RateLimitResult::Limited { retry_after };
        }

        timestamps.push_back(now);
        RateLimitResult::Allowed {
            remaining: self.max_requests - timestamps.len() as u32,
            reset_in: self.until_oldest_expires(timestamps, now),
        }
    }

    /// Check and record a request, reporting only whether it was admitted.
    pub async fn is_allowed(&self, identifier: &str) -> bool {
        self.check(identifier).await.is_allowed()
    }

    /// Prune every identifier and forget those with nothing left in the
    /// window (should be called periodically).
    pub async fn cleanup(&self) {
        let now = self.clock.now_ms();
        let mut requests = self.requests.write().await;
        let before = requests.len();

        requests.retain(|_, timestamps| {
            prune(timestamps, now, self.window_ms);
            !timestamps.is_empty()
        });

        debug!(
            removed = before - requests.len(),
            tracked = requests.len(),
            "Rate limiter cleanup"
        );
    }

    /// Number of identifiers currently tracked.
    pub async fn tracked(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Timestamps currently recorded for `identifier`, oldest first.
    pub async fn recorded(&self, identifier: &str) -> Vec<u64> {
        self.requests
            .read()
            .await
            .get(identifier)
            .map(|timestamps| timestamps.iter().copied().collect())
            .unwrap_or_default()
    }

    fn until_oldest_expires(&self, timestamps: &VecDeque<u64>, now: u64) -> Duration {
        let expires_at = timestamps.front().map_or(now, |oldest| oldest + self.window_ms);
        Duration::from_millis(expires_at.saturating_sub(now))
    }
}

/// Drop timestamps at least `window_ms` old.
fn prune(timestamps: &mut VecDeque<u64>, now: u64, window_ms: u64) {
    while let Some(&oldest) = timestamps.front() {
        if now.saturating_sub(oldest) < window_ms {
            break;
        }
        timestamps.pop_front();
    }
}
