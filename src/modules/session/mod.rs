//! Shared counters for a running attack session.
//!
//! Engines record attempts and cursor movement through a cheaply clonable
//! handle. The found flag is the cooperative stop signal workers poll; it
//! flips false to true at most once.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Clonable handle over one session's counters.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    attempts: AtomicU64,
    cursor: AtomicUsize,
    found: AtomicBool,
    started: Instant,
}

/// Point-in-time view of the session counters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub attempts: u64,
    pub cursor: usize,
    pub found: bool,
    pub elapsed: Duration,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::resume(0, 0, false)
    }

    /// Seeds the counters from a resumed checkpoint.
    pub fn resume(attempts: u64, cursor: usize, found: bool) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                attempts: AtomicU64::new(attempts),
                cursor: AtomicUsize::new(cursor),
                found: AtomicBool::new(found),
                started: Instant::now(),
            }),
        }
    }

    pub fn record_attempt(&self) {
        self.inner.attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_attempts(&self, count: u64) {
        self.inner.attempts.fetch_add(count, Ordering::Relaxed);
    }

    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Relaxed)
    }

    /// Moves the cursor past one consumed candidate; returns the new value.
    pub fn advance_cursor(&self) -> usize {
        self.inner.cursor.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn set_cursor(&self, position: usize) {
        self.inner.cursor.store(position, Ordering::Relaxed);
    }

    pub fn cursor(&self) -> usize {
        self.inner.cursor.load(Ordering::Relaxed)
    }

    /// Returns true only for the call that flipped the flag.
    pub fn mark_found(&self) -> bool {
        !self.inner.found.swap(true, Ordering::SeqCst)
    }

    pub fn found(&self) -> bool {
        self.inner.found.load(Ordering::SeqCst)
    }

    pub fn elapsed(&self) -> Duration {
        self.inner.started.elapsed()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            attempts: self.attempts(),
            cursor: self.cursor(),
            found: self.found(),
            elapsed: self.elapsed(),
        }
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let session = SessionTracker::new();
        assert_eq!(session.attempts(), 0);
        assert_eq!(session.cursor(), 0);
        assert!(!session.found());
    }

    #[test]
    fn found_flips_exactly_once() {
        let session = SessionTracker::new();
        assert!(session.mark_found());
        assert!(!session.mark_found());
        assert!(session.found());
    }

    #[test]
    fn clones_share_state() {
        let session = SessionTracker::new();
        let handle = session.clone();
        handle.record_attempts(3);
        handle.advance_cursor();
        assert_eq!(session.attempts(), 3);
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn resume_seeds_counters() {
        let session = SessionTracker::resume(120, 50, false);
        assert_eq!(session.attempts(), 120);
        assert_eq!(session.cursor(), 50);
        assert!(!session.found());
        session.record_attempt();
        assert_eq!(session.attempts(), 121);
    }
}
