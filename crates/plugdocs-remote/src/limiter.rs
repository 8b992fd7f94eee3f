//! Sliding-window rate limiter for outbound API calls.
//!
//! This is a local approximation of the remote host's quota. It does not
//! coordinate across processes.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Snapshot of limiter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitStats {
    /// Requests recorded within the current window.
    pub requests_in_window: usize,
    /// Ceiling per window.
    pub max_requests: usize,
    /// Requests still allowed right now.
    pub remaining: usize,
    /// Window length in milliseconds.
    pub window_ms: u64,
    /// Milliseconds until the oldest recorded request leaves the window.
    pub reset_in_ms: u64,
}

/// Bounds the number of requests within a sliding time window.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    poll_interval: Duration,
    requests: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`.
    ///
    /// [`RateLimiter::wait_for_slot`] re-checks every `poll_interval`.
    pub fn new(max_requests: usize, window: Duration, poll_interval: Duration) -> Self {
        Self {
            max_requests,
            window,
            poll_interval,
            requests: Mutex::new(VecDeque::new()),
        }
    }

    /// Claim a slot if one is free.
    ///
    /// Prunes timestamps that have left the window, then records a new request
    /// and returns `true` when the count is below the ceiling.
    pub fn can_make_request(&self) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();
        self.prune(&mut requests, now);
        if requests.len() < self.max_requests {
            requests.push_back(now);
            true
        } else {
            false
        }
    }

    /// Wait until a slot is claimed.
    ///
    /// Polls forever; callers wanting a deadline must wrap this in a timeout.
    pub async fn wait_for_slot(&self) {
        let mut waited = false;
        while !self.can_make_request() {
            if !waited {
                tracing::warn!(
                    max_requests = self.max_requests,
                    window_secs = self.window.as_secs(),
                    "Rate limit reached, waiting for a free slot"
                );
                waited = true;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Current usage of the window.
    pub fn stats(&self) -> RateLimitStats {
        let now = Instant::now();
        let mut requests = self.requests.lock().unwrap();
        self.prune(&mut requests, now);
        let reset_in = requests.front().map_or(Duration::ZERO, |oldest| {
            (*oldest + self.window).saturating_duration_since(now)
        });
        RateLimitStats {
            requests_in_window: requests.len(),
            max_requests: self.max_requests,
            remaining: self.max_requests.saturating_sub(requests.len()),
            window_ms: duration_ms(self.window),
            reset_in_ms: duration_ms(reset_in),
        }
    }

    fn prune(&self, requests: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = requests.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                requests.pop_front();
            } else {
                break;
            }
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
