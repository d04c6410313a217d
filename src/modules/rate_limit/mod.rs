//! Sliding-window request rate limiting.
//!
//! Admits at most a configured number of requests per trailing one-second
//! window. Callers over the ceiling are suspended until the oldest admission
//! leaves the window, then re-checked.

use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW: Duration = Duration::from_secs(1);

/// Async limiter enforcing a per-second admission ceiling.
#[derive(Debug)]
pub struct RateLimiter {
    ceiling: usize,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(ceiling: usize) -> Self {
        let ceiling = ceiling.max(1);
        Self {
            ceiling,
            window: Mutex::new(VecDeque::with_capacity(ceiling)),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Suspends until an admission slot is free, then records the admission.
    ///
    /// The window lock is released while sleeping so other callers can be
    /// admitted as slots open.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                Self::prune(&mut window, now);
                if window.len() < self.ceiling {
                    window.push_back(now);
                    return;
                }
                window
                    .front()
                    .map(|oldest| WINDOW.saturating_sub(now - *oldest))
                    .unwrap_or(WINDOW)
            };
            log::debug!("rate ceiling reached, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn prune(window: &mut VecDeque<Instant>, now: Instant) {
        let cutoff = now - WINDOW;
        while matches!(window.front(), Some(ts) if *ts < cutoff) {
            window.pop_front();
        }
    }
}
