use chrono::{DateTime, Utc};

/// One inbound unit of work: who sent it and what to hand downstream.
#[derive(Debug, Clone)]
pub struct Envelope<P> {
    pub sender_id: String,
    pub payload: P,
    /// Insertion time, for diagnostics only; never used for ordering.
    pub enqueued_at: DateTime<Utc>,
}

impl<P> Envelope<P> {
    /// Builds an envelope stamped with the current time. The sender id is checked on push.
    pub fn new(sender_id: impl Into<String>, payload: P) -> Self {
        Self {
            sender_id: sender_id.into(),
            payload,
            enqueued_at: Utc::now(),
        }
    }

    pub(crate) fn has_sender(&self) -> bool {
        !self.sender_id.trim().is_empty()
    }
}
