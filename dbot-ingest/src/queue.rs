//! Unbounded multi-producer FIFO of envelopes.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::error::{IngestError, Result};

/// Thread-safe FIFO with no capacity bound.
///
/// Producers `push` concurrently; a single consumer `pop`s and, when an envelope is throttled,
/// `requeue`s it at the tail. Depth is observable through [`len`](Self::len).
pub struct IngestQueue<P> {
    items: Mutex<VecDeque<Envelope<P>>>,
    available: Notify,
    pushed: Notify,
}

impl<P> Default for IngestQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> IngestQueue<P> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            available: Notify::new(),
            pushed: Notify::new(),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds a consistent deque.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Envelope<P>>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends to the tail and wakes one waiting consumer.
    /// Envelopes without a sender id are rejected and never enqueued.
    pub fn push(&self, envelope: Envelope<P>) -> Result<()> {
        if !envelope.has_sender() {
            warn!("Rejected envelope without sender id");
            return Err(IngestError::MissingSender);
        }
        let depth = {
            let mut items = self.lock();
            items.push_back(envelope);
            items.len()
        };
        debug!(queue_depth = depth, "Envelope enqueued");
        self.available.notify_one();
        self.pushed.notify_one();
        Ok(())
    }

    /// Puts a throttled envelope back at the tail, behind everything currently waiting.
    pub fn requeue(&self, envelope: Envelope<P>) {
        self.lock().push_back(envelope);
    }

    /// Removes and returns the head, or `None` when empty.
    pub fn try_pop(&self) -> Option<Envelope<P>> {
        self.lock().pop_front()
    }

    /// Removes and returns the head, waiting while the queue is empty.
    pub async fn pop(&self) -> Envelope<P> {
        loop {
            if let Some(envelope) = self.try_pop() {
                return envelope;
            }
            // A push between try_pop and here leaves a permit, so the wake-up is not lost.
            self.available.notified().await;
        }
    }

    /// Like [`pop`](Self::pop) but returns `None` once `token` is cancelled.
    /// Cancellation wins over a ready item; nothing is removed in that case.
    pub async fn pop_or_cancel(&self, token: &CancellationToken) -> Option<Envelope<P>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => None,
            envelope = self.pop() => Some(envelope),
        }
    }

    /// Resolves after a producer pushed. May resolve immediately for a push that was already
    /// consumed; callers treat it as a hint to look at the queue again.
    pub async fn wait_for_push(&self) {
        self.pushed.notified().await;
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Removes everything still queued, head first.
    pub fn drain_pending(&self) -> Vec<Envelope<P>> {
        self.lock().drain(..).collect()
    }
}
