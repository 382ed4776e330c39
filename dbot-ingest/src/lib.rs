//! # dbot-ingest
//!
//! Inbound side of the bridge: producers push [`Envelope`]s into an [`IngestQueue`]; a
//! [`Drainer`] pops them one at a time, asks the [`RateLimiter`] whether the sender may be
//! served now, and either hands the payload to an [`EnvelopeHandler`] or requeues it at the tail.
//! [`ShardedIngest`] runs several drainers with senders pinned to shards by hash.

mod clock;
mod config;
mod drainer;
mod envelope;
mod error;
mod limiter;
mod queue;
mod shard;
mod stats;

pub use clock::SenderClock;
pub use config::IngestConfig;
pub use drainer::{Drainer, DrainerSettings, EnvelopeHandler, HandlerFailure};
pub use envelope::Envelope;
pub use error::{IngestError, Result};
pub use limiter::{Admission, RateLimiter};
pub use queue::IngestQueue;
pub use shard::ShardedIngest;
pub use stats::{DrainerStats, StatsSnapshot};
