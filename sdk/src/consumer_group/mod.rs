//! Consumer-group sessions.
//!
//! A member of a group repeatedly joins a *session*: the broker assigns it a set
//! of partitions (claims), the [`ConsumerGroupHandler`] is set up, every claim is
//! consumed concurrently until the session ends (rebalance or shutdown), and the
//! handler is cleaned up. [`ConsumerGroupRunner`] rejoins after every session
//! until shutdown is requested or the group is closed.

mod claim;
mod handler;
mod kafka;
mod offsets;
mod ready;
mod runner;
mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use claim::Claim;
pub use handler::LoggingHandler;
pub use kafka::KafkaConsumerGroup;
pub use offsets::MarkedOffsets;
pub use ready::ReadySignal;
pub use runner::ConsumerGroupRunner;
pub use state::{ConsumerState, StateTracker};

use crate::error::TickerError;
use crate::message::ConsumerMessage;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

/// Lifecycle callbacks invoked by a [`ConsumerGroup`] for every session.
#[async_trait]
pub trait ConsumerGroupHandler: Send + Sync {
    /// Runs once the session has its claims, before any `consume_claim`.
    async fn setup(&self, session: &dyn GroupSession) -> Result<(), TickerError>;

    /// Runs after every `consume_claim` of the session has returned.
    async fn cleanup(&self, session: &dyn GroupSession) -> Result<(), TickerError>;

    /// Consumes one claim. Must keep reading until the claim's stream ends,
    /// which happens when the session is over or the partition is revoked.
    async fn consume_claim(
        &self,
        session: &dyn GroupSession,
        claim: &mut Claim,
    ) -> Result<(), TickerError>;
}

/// The member's view of one session.
pub trait GroupSession: Send + Sync {
    fn group_id(&self) -> &str;

    /// 1 for the first session joined by this member, incremented on every rejoin.
    fn generation(&self) -> u64;

    /// Assigned partitions, by topic.
    fn claims(&self) -> &BTreeMap<String, Vec<i32>>;

    /// Marks `message` as processed: the partition's committed offset advances
    /// past it. Marking an older or the same message again has no effect.
    fn mark_message(&self, message: &ConsumerMessage);
}

#[async_trait]
pub trait ConsumerGroup: Send + Sync {
    /// Joins the group and runs a single session with `handler`.
    ///
    /// Returns when the session ends because of a rebalance, or as soon as
    /// `shutdown` is cancelled. Fails with [`TickerError::ClosedConsumerGroup`]
    /// once [`ConsumerGroup::close`] has been called.
    async fn consume(
        &self,
        topics: &[String],
        handler: &dyn ConsumerGroupHandler,
        shutdown: &CancellationToken,
    ) -> Result<(), TickerError>;

    /// Leaves the group. Safe to call more than once.
    async fn close(&self) -> Result<(), TickerError>;
}
