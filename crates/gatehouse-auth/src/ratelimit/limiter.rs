//! Fixed-window rate limiter keyed by source address.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use gatehouse_core::config::RateLimitConfig;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request is admitted; `remaining` more fit in this window.
    Allowed {
        /// Requests still admissible in the current window.
        remaining: u32,
    },
    /// The budget is spent until the window rolls over.
    Limited {
        /// Time until the current window ends.
        retry_after: Duration,
    },
}

impl RateDecision {
    /// Whether the request was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-address fixed-window counter.
///
/// Each address gets `max_requests` admissions per `window`. Counters live
/// in a sharded map, so addresses on different shards never contend.
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    windows: Arc<DashMap<IpAddr, Window>>,
    max_requests: u32,
    window: Duration,
}

impl AuthRateLimiter {
    /// Creates a limiter admitting `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    /// Creates a limiter from configuration.
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_seconds))
    }

    /// Length of one window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a request from `addr` now.
    pub fn check(&self, addr: IpAddr) -> RateDecision {
        self.check_at(addr, Instant::now())
    }

    /// Records a request from `addr` at `now`.
    pub fn check_at(&self, addr: IpAddr, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(addr).or_insert_with(|| Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let elapsed = now.saturating_duration_since(entry.started);
            return RateDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    /// Drops windows that have ended. Returns how many were removed.
    pub fn prune(&self) -> usize {
        self.prune_at(Instant::now())
    }

    /// Drops windows that have ended by `now`.
    pub fn prune_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked addresses.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }
}
