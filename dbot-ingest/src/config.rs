use std::time::Duration;

use tokio::time::Instant;

use crate::error::{IngestError, Result};

/// Ingest tuning. Read once at startup and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Minimum time between two admitted envelopes of the same sender.
    pub window: Duration,
    /// Shortest pause after a full cycle of throttled envelopes.
    pub retry_pause: Duration,
    /// Clock entries older than `window * clock_idle_multiplier` are evicted.
    pub clock_idle_multiplier: u32,
    /// Number of drainer shards.
    pub workers: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(30),
            retry_pause: Duration::from_millis(10),
            clock_idle_multiplier: 4,
            workers: 1,
        }
    }
}

impl IngestConfig {
    /// Upper bound for `window` and `retry_pause`.
    pub const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_retry_pause(mut self, pause: Duration) -> Self {
        self.retry_pause = pause;
        self
    }

    pub fn with_clock_idle_multiplier(mut self, multiplier: u32) -> Self {
        self.clock_idle_multiplier = multiplier;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(IngestError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.clock_idle_multiplier == 0 {
            return Err(IngestError::InvalidConfig(
                "clock_idle_multiplier must be at least 1".to_string(),
            ));
        }
        if self.window > Self::MAX_WINDOW {
            return Err(IngestError::InvalidConfig(format!(
                "window of {}s exceeds the maximum of {}s",
                self.window.as_secs(),
                Self::MAX_WINDOW.as_secs()
            )));
        }
        if self.retry_pause > Self::MAX_WINDOW {
            return Err(IngestError::InvalidConfig(format!(
                "retry_pause of {}ms exceeds the maximum of {}s",
                self.retry_pause.as_millis(),
                Self::MAX_WINDOW.as_secs()
            )));
        }
        if self.window.checked_mul(self.clock_idle_multiplier).is_none() {
            return Err(IngestError::InvalidConfig(
                "window * clock_idle_multiplier overflows".to_string(),
            ));
        }
        Ok(())
    }
}

/// `base + offset` with the offset capped at [`IngestConfig::MAX_WINDOW`], so limiter and
/// drainer deadlines never overflow even for settings that bypassed `validate`.
pub(crate) fn deadline(base: Instant, offset: Duration) -> Instant {
    base + offset.min(IngestConfig::MAX_WINDOW)
}
