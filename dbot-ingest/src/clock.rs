//! Per-sender "last processed" instants.

use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::deadline;

/// Map from sender id to the monotonic instant its last envelope was admitted.
///
/// Entries appear on first admission and are only removed by [`evict_idle`](Self::evict_idle).
#[derive(Debug, Default)]
pub struct SenderClock {
    entries: DashMap<String, Instant>,
}

impl SenderClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_processed(&self, sender_id: &str) -> Option<Instant> {
        self.entries.get(sender_id).map(|entry| *entry)
    }

    /// Records `now` for the sender if at least `window` has passed since its last admission
    /// (or it has none). Check and update happen under the same shard lock.
    /// On denial returns the instant the sender becomes eligible again.
    pub(crate) fn try_advance(
        &self,
        sender_id: &str,
        now: Instant,
        window: Duration,
    ) -> Result<(), Instant> {
        match self.entries.entry(sender_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let last = *entry.get();
                if now.saturating_duration_since(last) >= window {
                    entry.insert(now);
                    Ok(())
                } else {
                    Err(deadline(last, window))
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Ok(())
            }
        }
    }

    /// Drops senders whose last admission is at least `idle_after` old. Returns how many were removed.
    pub fn evict_idle(&self, now: Instant, idle_after: Duration) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, last| {
            let keep = now.saturating_duration_since(*last) < idle_after;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
