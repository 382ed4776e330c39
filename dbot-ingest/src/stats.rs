use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every drainer of one ingest pipeline.
#[derive(Debug, Default)]
pub struct DrainerStats {
    admitted: AtomicU64,
    throttled: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
}

/// Point-in-time copy of [`DrainerStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Envelopes handed to the downstream handler.
    pub admitted: u64,
    /// Admission denials (one envelope can be denied many times).
    pub throttled: u64,
    /// Handler errors and panics; those envelopes were dropped.
    pub failed: u64,
    /// Pushes refused because the envelope had no sender id.
    pub rejected: u64,
}

impl DrainerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_throttled(&self) {
        self.throttled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}
