//! Global rate limiting for report downloads
//!
//! [`RateLimiter`] admits at most `quota` acquisitions within any sliding
//! window of `window` length. It is shared by every download task through an
//! `Arc` and works independently of the fetcher's concurrency gate: the gate
//! bounds requests in flight, the limiter bounds requests started per window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window rate limiter shared across download tasks
#[derive(Debug)]
pub struct RateLimiter {
    quota: usize,
    window: Duration,

    /// Start times of the acquisitions still inside the window, oldest first
    slots: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `quota` operations per `window`
    ///
    /// A zero quota is treated as one.
    pub fn new(quota: usize, window: Duration) -> Self {
        let quota = quota.max(1);
        tracing::debug!(
            "Creating rate limiter: {} per {}ms",
            quota,
            window.as_millis()
        );
        Self {
            quota,
            window,
            slots: Mutex::new(VecDeque::with_capacity(quota)),
        }
    }

    /// Configured operations per window
    pub fn quota(&self) -> usize {
        self.quota
    }

    /// Configured window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Waits until a slot is free and claims it
    ///
    /// The slot is stamped with the acquisition time and expires on its own
    /// once the window has passed; nothing needs to be released.
    pub async fn acquire(&self) {
        loop {
            let wait_until = {
                let mut slots = self.slots.lock().await;
                let now = Instant::now();

                while let Some(&oldest) = slots.front() {
                    if oldest + self.window <= now {
                        slots.pop_front();
                    } else {
                        break;
                    }
                }

                if slots.len() < self.quota {
                    slots.push_back(now);
                    return;
                }

                match slots.front() {
                    Some(&oldest) => oldest + self.window,
                    None => now,
                }
            };

            tracing::trace!("Rate limit reached, waiting for a free slot");
            tokio::time::sleep_until(wait_until).await;
        }
    }
}
