//! The consuming loop: pop, check admission, dispatch or requeue.
//!
//! One drainer processes strictly one envelope at a time. A throttled envelope goes back to the
//! tail so other senders are looked at first. When a whole pass over the queue produced only
//! denials, the drainer sleeps until the earliest sender becomes eligible (never less than
//! `retry_pause`), waking early on a new push or on cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::{deadline, IngestConfig};
use crate::envelope::Envelope;
use crate::limiter::{Admission, RateLimiter};
use crate::queue::IngestQueue;
use crate::stats::{DrainerStats, StatsSnapshot};

/// Error returned by a downstream handler. The envelope is dropped, never retried.
pub type HandlerFailure = anyhow::Error;

/// Downstream consumer of admitted payloads.
#[async_trait]
pub trait EnvelopeHandler<P>: Send + Sync {
    async fn handle(&self, payload: P) -> Result<(), HandlerFailure>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainerSettings {
    /// Shortest sleep after a pass where every queued envelope was throttled.
    pub retry_pause: Duration,
    /// How often idle clock entries are evicted and status is logged.
    pub sweep_interval: Duration,
}

impl Default for DrainerSettings {
    fn default() -> Self {
        Self::from(&IngestConfig::default())
    }
}

impl From<&IngestConfig> for DrainerSettings {
    fn from(config: &IngestConfig) -> Self {
        Self {
            retry_pause: config.retry_pause,
            sweep_interval: config
                .window
                .clamp(Duration::from_secs(1), IngestConfig::MAX_WINDOW),
        }
    }
}

/// Denials since the last admission.
#[derive(Debug, Default)]
struct ThrottleCycle {
    denials: usize,
    earliest_ready: Option<Instant>,
}

impl ThrottleCycle {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns true once every envelope currently queued has been denied in this cycle.
    fn record_denial(&mut self, ready_at: Instant, queue_depth: usize) -> bool {
        self.denials += 1;
        self.earliest_ready = Some(match self.earliest_ready {
            Some(earliest) => earliest.min(ready_at),
            None => ready_at,
        });
        self.denials >= queue_depth
    }

    fn wake_at(&self, now: Instant, min_pause: Duration) -> Instant {
        let floor = deadline(now, min_pause);
        self.earliest_ready.map_or(floor, |ready| ready.max(floor))
    }
}

/// Single serial consumer of an [`IngestQueue`].
pub struct Drainer<P> {
    name: String,
    queue: Arc<IngestQueue<P>>,
    limiter: Arc<RateLimiter>,
    handler: Arc<dyn EnvelopeHandler<P>>,
    settings: DrainerSettings,
    stats: Arc<DrainerStats>,
}

impl<P: Send + 'static> Drainer<P> {
    pub fn new(
        queue: Arc<IngestQueue<P>>,
        limiter: Arc<RateLimiter>,
        handler: Arc<dyn EnvelopeHandler<P>>,
        settings: DrainerSettings,
    ) -> Self {
        Self {
            name: "drainer".to_string(),
            queue,
            limiter,
            handler,
            settings,
            stats: Arc::new(DrainerStats::new()),
        }
    }

    /// Label used in log spans (e.g. the shard index).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Shares counters with other drainers of the same pipeline.
    pub fn with_stats(mut self, stats: Arc<DrainerStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> Arc<DrainerStats> {
        Arc::clone(&self.stats)
    }

    pub fn spawn(self, token: CancellationToken) -> JoinHandle<StatsSnapshot> {
        tokio::spawn(self.run(token))
    }

    /// Runs until `token` is cancelled. Envelopes still queued at that point stay in the queue.
    #[instrument(skip_all, fields(drainer = %self.name))]
    pub async fn run(self, token: CancellationToken) -> StatsSnapshot {
        info!(
            retry_pause_ms = self.settings.retry_pause.as_millis() as u64,
            window_secs = self.limiter.window().as_secs(),
            "Drainer started"
        );
        let mut cycle = ThrottleCycle::default();
        let mut next_sweep = deadline(Instant::now(), self.settings.sweep_interval);

        while let Some(envelope) = self.queue.pop_or_cancel(&token).await {
            let now = Instant::now();
            if now >= next_sweep {
                self.sweep(now);
                next_sweep = deadline(now, self.settings.sweep_interval);
            }

            match self.limiter.check(&envelope.sender_id, now) {
                Admission::Admitted => {
                    cycle.reset();
                    self.dispatch(envelope).await;
                }
                Admission::Throttled { ready_at } => {
                    self.stats.record_throttled();
                    debug!(
                        sender_id = %envelope.sender_id,
                        ready_in_ms = ready_at.saturating_duration_since(now).as_millis() as u64,
                        "Sender throttled, envelope requeued"
                    );
                    self.queue.requeue(envelope);
                    if cycle.record_denial(ready_at, self.queue.len()) {
                        let wake_at = cycle.wake_at(now, self.settings.retry_pause);
                        cycle.reset();
                        if !self.pause_until(wake_at, &token).await {
                            break;
                        }
                    }
                }
            }
        }

        let stats = self.stats.snapshot();
        info!(
            queue_depth = self.queue.len(),
            admitted = stats.admitted,
            throttled = stats.throttled,
            failed = stats.failed,
            "Drainer stopped"
        );
        stats
    }

    /// Sleeps until `wake_at` or the next push. Returns false if cancelled.
    async fn pause_until(&self, wake_at: Instant, token: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = token.cancelled() => false,
            _ = sleep_until(wake_at) => true,
            _ = self.queue.wait_for_push() => true,
        }
    }

    /// Runs the handler on its own task so an error or panic only costs this envelope.
    async fn dispatch(&self, envelope: Envelope<P>) {
        let Envelope {
            sender_id,
            payload,
            enqueued_at,
        } = envelope;
        self.stats.record_admitted();
        debug!(
            sender_id = %sender_id,
            waited_ms = (Utc::now() - enqueued_at).num_milliseconds(),
            "Envelope admitted"
        );

        let handler = Arc::clone(&self.handler);
        match tokio::spawn(async move { handler.handle(payload).await }).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stats.record_failed();
                error!(sender_id = %sender_id, error = %e, "Downstream handler failed, envelope dropped");
            }
            Err(e) => {
                self.stats.record_failed();
                error!(
                    sender_id = %sender_id,
                    panicked = e.is_panic(),
                    error = %e,
                    "Downstream handler aborted, envelope dropped"
                );
            }
        }
    }

    fn sweep(&self, now: Instant) {
        let evicted = self.limiter.evict_idle(now);
        let stats = self.stats.snapshot();
        info!(
            queue_depth = self.queue.len(),
            tracked_senders = self.limiter.tracked_senders(),
            evicted,
            admitted = stats.admitted,
            throttled = stats.throttled,
            failed = stats.failed,
            rejected = stats.rejected,
            "Ingest status"
        );
    }
}
