// SPDX-FileCopyrightText: 2026 Rentri Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side sliding-window rate limiting.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Timestamps of recent requests, at most `capacity` inside any `window`.
///
/// Pure bookkeeping: the caller supplies `now`, which keeps the window
/// testable without a clock.
#[derive(Debug, Clone)]
pub struct RateWindow {
    capacity: usize,
    window: Duration,
    margin: Duration,
    stamps: VecDeque<Instant>,
}

impl RateWindow {
    pub fn new(capacity: usize, window: Duration, margin: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            window,
            margin,
            stamps: VecDeque::with_capacity(capacity),
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long to wait before a request may be sent at `now`, if at all.
    pub fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        self.prune(now);
        if self.stamps.len() < self.capacity {
            return None;
        }
        let oldest = *self.stamps.front()?;
        let age = now.saturating_duration_since(oldest);
        Some(self.window.saturating_sub(age) + self.margin)
    }

    pub fn record(&mut self, now: Instant) {
        self.stamps.push_back(now);
    }

    /// Requests recorded within the window ending at `now`.
    pub fn in_window(&self, now: Instant) -> usize {
        self.stamps
            .iter()
            .filter(|&&t| now.saturating_duration_since(t) < self.window)
            .count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Async gate around a [`RateWindow`], owned by one client instance.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    pub fn new(capacity: usize, window: Duration, margin: Duration) -> Self {
        Self {
            window: Mutex::new(RateWindow::new(capacity, window, margin)),
        }
    }

    pub fn from_config(config: &rentri_config::model::RateLimitConfig) -> Self {
        Self::new(
            config.max_requests,
            config.window(),
            config.safety_margin(),
        )
    }

    /// Waits for a free slot and records it.
    ///
    /// The lock is held across the sleep, so waiting callers are served in
    /// arrival order and can never overshoot the window together.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            match window.wait_time(now) {
                None => {
                    window.record(now);
                    return;
                }
                Some(wait) => {
                    debug!(wait_ms = wait.as_millis() as u64, "rate window full, waiting");
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
