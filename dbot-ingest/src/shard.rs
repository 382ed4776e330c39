//! Several drainers, each with its own queue, sharing one rate limiter.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::IngestConfig;
use crate::drainer::{Drainer, DrainerSettings, EnvelopeHandler};
use crate::envelope::Envelope;
use crate::error::{IngestError, Result};
use crate::limiter::RateLimiter;
use crate::queue::IngestQueue;
use crate::stats::{DrainerStats, StatsSnapshot};

/// Producer-facing entry point of the ingest pipeline.
///
/// A sender always hashes to the same shard, so its envelopes are still handled one at a time
/// and in admission order; only different senders run in parallel. With one worker this is a
/// single serial drainer.
pub struct ShardedIngest<P> {
    shards: Vec<Arc<IngestQueue<P>>>,
    limiter: Arc<RateLimiter>,
    settings: DrainerSettings,
    stats: Arc<DrainerStats>,
    spawned: AtomicBool,
}

impl<P: Send + 'static> ShardedIngest<P> {
    pub fn new(config: &IngestConfig) -> Result<Self> {
        config.validate()?;
        let shards = (0..config.workers)
            .map(|_| Arc::new(IngestQueue::new()))
            .collect();
        Ok(Self {
            shards,
            limiter: Arc::new(RateLimiter::from_config(config)),
            settings: DrainerSettings::from(config),
            stats: Arc::new(DrainerStats::new()),
            spawned: AtomicBool::new(false),
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard_for(&self, sender_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        sender_id.hash(&mut hasher);
        (hasher.finish() % self.shards.len() as u64) as usize
    }

    /// Routes the envelope to its sender's shard. Rejections are counted in the stats.
    pub fn push(&self, envelope: Envelope<P>) -> Result<()> {
        let shard = self.shard_for(&envelope.sender_id);
        let pushed = self.shards[shard].push(envelope);
        if pushed.is_err() {
            self.stats.record_rejected();
        }
        pushed
    }

    /// Total envelopes waiting across shards.
    pub fn depth(&self) -> usize {
        self.shards.iter().map(|q| q.len()).sum()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Starts one drainer per shard. The returned task finishes after all drainers stopped.
    /// Each queue has exactly one consumer, so a second call fails with `AlreadySpawned`.
    pub fn spawn(
        &self,
        handler: Arc<dyn EnvelopeHandler<P>>,
        token: CancellationToken,
    ) -> Result<JoinHandle<StatsSnapshot>> {
        if self.spawned.swap(true, Ordering::SeqCst) {
            return Err(IngestError::AlreadySpawned);
        }
        let mut drainers = JoinSet::new();
        for (index, queue) in self.shards.iter().enumerate() {
            let drainer = Drainer::new(
                Arc::clone(queue),
                Arc::clone(&self.limiter),
                Arc::clone(&handler),
                self.settings.clone(),
            )
            .with_name(format!("shard-{}", index))
            .with_stats(Arc::clone(&self.stats));
            drainers.spawn(drainer.run(token.clone()));
        }
        info!(shards = self.shards.len(), "Ingest drainers spawned");

        let stats = Arc::clone(&self.stats);
        Ok(tokio::spawn(async move {
            while let Some(joined) = drainers.join_next().await {
                if let Err(e) = joined {
                    error!(error = %e, "Drainer task ended abnormally");
                }
            }
            stats.snapshot()
        }))
    }

    /// Removes everything still queued on every shard.
    pub fn drain_pending(&self) -> Vec<Envelope<P>> {
        self.shards.iter().flat_map(|q| q.drain_pending()).collect()
    }
}
