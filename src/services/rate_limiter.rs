// src/services/rate_limiter.rs
use std::{
    collections::{HashMap, VecDeque},
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

/// Time source for the limiter.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32, reset_after: Duration },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Sliding-window request log keyed by client identifier.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<String, VecDeque<Instant>>>>,
    clock: Arc<dyn Clock>,
    window: Duration,
    max_requests: u32,
}

impl Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .finish()
    }
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self::with_clock(window, max_requests, Arc::new(SystemClock))
    }

    pub fn with_clock(window: Duration, max_requests: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
            window,
            max_requests,
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Record a hit for `key` if it still fits inside the window.
    /// Rejected hits are not recorded.
    pub async fn check(&self, key: &str) -> RateDecision {
        let now = self.clock.now();
        let mut guard = self.inner.lock().await;
        let hits = guard.entry(key.to_string()).or_default();

        while hits
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            hits.pop_front();
        }

        if hits.len() >= self.max_requests as usize {
            let retry_after = hits
                .front()
                .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
                .unwrap_or(self.window);
            return RateDecision::Limited { retry_after };
        }

        hits.push_back(now);
        let oldest = hits.front().copied().unwrap_or(now);
        RateDecision::Allowed {
            remaining: self.max_requests - hits.len() as u32,
            reset_after: self.window.saturating_sub(now.duration_since(oldest)),
        }
    }

    /// Drop clients with no hits inside the window. Returns number removed.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut guard = self.inner.lock().await;
        let before = guard.len();
        guard.retain(|_, hits| {
            hits.back()
                .is_some_and(|latest| now.duration_since(*latest) < self.window)
        });
        before - guard.len()
    }

    /// Number of tracked clients
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}
