//! Admission policy: at most one admitted envelope per sender per window.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::clock::SenderClock;
use crate::config::{deadline, IngestConfig};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Denied; the sender becomes eligible at `ready_at`.
    Throttled { ready_at: Instant },
}

/// Per-sender rate limiter over a [`SenderClock`].
///
/// Eviction age is `window * idle_multiplier` with a multiplier of at least 1, so an evicted
/// sender would have been admitted anyway and eviction never changes a decision.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    idle_after: Duration,
    clock: SenderClock,
}

impl RateLimiter {
    pub const DEFAULT_IDLE_MULTIPLIER: u32 = 4;

    pub fn new(window: Duration) -> Self {
        Self {
            window,
            idle_after: window.saturating_mul(Self::DEFAULT_IDLE_MULTIPLIER),
            clock: SenderClock::new(),
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.window).with_idle_multiplier(config.clock_idle_multiplier)
    }

    pub fn with_idle_multiplier(mut self, multiplier: u32) -> Self {
        self.idle_after = self.window.saturating_mul(multiplier.max(1));
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn clock(&self) -> &SenderClock {
        &self.clock
    }

    /// True if the sender may be served at `now`; admission records `now` as its last instant.
    pub fn admit(&self, sender_id: &str, now: Instant) -> bool {
        matches!(self.check(sender_id, now), Admission::Admitted)
    }

    /// Same decision as [`admit`](Self::admit), keeping the ready-at instant of a denial.
    pub fn check(&self, sender_id: &str, now: Instant) -> Admission {
        match self.clock.try_advance(sender_id, now, self.window) {
            Ok(()) => Admission::Admitted,
            Err(ready_at) => Admission::Throttled { ready_at },
        }
    }

    /// When the sender next becomes eligible, or `None` if it has no recorded admission.
    pub fn ready_at(&self, sender_id: &str) -> Option<Instant> {
        self.clock
            .last_processed(sender_id)
            .map(|last| deadline(last, self.window))
    }

    pub fn evict_idle(&self, now: Instant) -> usize {
        let removed = self.clock.evict_idle(now, self.idle_after);
        if removed > 0 {
            debug!(
                removed,
                tracked = self.clock.len(),
                "Evicted idle senders from clock"
            );
        }
        removed
    }

    pub fn tracked_senders(&self) -> usize {
        self.clock.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn fresh_sender_admitted_once_then_denied() {
        let limiter = RateLimiter::new(secs(30));
        let t0 = Instant::now();
        assert!(limiter.admit("u1", t0));
        assert!(!limiter.admit("u1", t0));
        assert!(!limiter.admit("u1", t0 + secs(29)));
    }

    #[test]
    fn huge_window_saturates_instead_of_overflowing() {
        let limiter = RateLimiter::new(Duration::MAX).with_idle_multiplier(u32::MAX);
        let t0 = Instant::now();
        assert!(limiter.admit("u1", t0));
        assert_eq!(
            limiter.check("u1", t0 + secs(1)),
            Admission::Throttled {
                ready_at: t0 + IngestConfig::MAX_WINDOW
            }
        );
        assert_eq!(limiter.evict_idle(t0 + secs(1)), 0);
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let limiter = RateLimiter::new(secs(30));
        let t0 = Instant::now();
        assert!(limiter.admit("u1", t0));
        assert!(limiter.admit("u1", t0 + secs(30)));
    }

    #[test]
    fn scenario_two_senders() {
        let limiter = RateLimiter::new(secs(30));
        let t0 = Instant::now();

        assert!(limiter.admit("u1", t0));
        assert_eq!(limiter.clock().last_processed("u1"), Some(t0));

        assert_eq!(
            limiter.check("u1", t0 + secs(5)),
            Admission::Throttled {
                ready_at: t0 + secs(30)
            }
        );
        assert_eq!(limiter.clock().last_processed("u1"), Some(t0));

        assert!(limiter.admit("u2", t0 + secs(5)));

        assert!(limiter.admit("u1", t0 + secs(31)));
        assert_eq!(limiter.clock().last_processed("u1"), Some(t0 + secs(31)));
    }

    #[test]
    fn zero_window_admits_everything() {
        let limiter = RateLimiter::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(limiter.admit("u1", t0));
        assert!(limiter.admit("u1", t0));
    }

    #[test]
    fn eviction_does_not_change_decisions() {
        let limiter = RateLimiter::new(secs(30)).with_idle_multiplier(0);
        let t0 = Instant::now();
        limiter.admit("u1", t0);

        assert_eq!(limiter.evict_idle(t0 + secs(29)), 0);
        assert!(!limiter.admit("u1", t0 + secs(29)));

        assert_eq!(limiter.evict_idle(t0 + secs(30)), 1);
        assert_eq!(limiter.tracked_senders(), 0);
        assert!(limiter.admit("u1", t0 + secs(30)));
    }

    #[test]
    fn ready_at_tracks_last_admission() {
        let limiter = RateLimiter::new(secs(30));
        let t0 = Instant::now();
        assert!(limiter.ready_at("u1").is_none());
        limiter.admit("u1", t0);
        assert_eq!(limiter.ready_at("u1"), Some(t0 + secs(30)));
    }
}
