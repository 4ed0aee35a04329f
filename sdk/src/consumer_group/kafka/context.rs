use crate::context::{forward_error, forward_log};
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::consumer::{BaseConsumer, ConsumerContext, Rebalance};
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::{ClientContext, TopicPartitionList};
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Rebalance callback, as seen by the session loop.
#[derive(Debug)]
pub(crate) enum RebalanceEvent {
    Assigned(Vec<(String, i32)>),
    Revoked(Vec<(String, i32)>),
    Failed(KafkaError),
}

/// Consumer context that hands rebalance callbacks over to the session loop.
///
/// Callbacks run on the thread polling the consumer, so they only enqueue,
/// except for a revocation, which also cancels the current session's token
/// before librdkafka drops the assignment.
pub(crate) struct GroupContext {
    events: mpsc::UnboundedSender<RebalanceEvent>,
    revoked: Mutex<CancellationToken>,
}

impl GroupContext {
    pub(crate) fn new(events: mpsc::UnboundedSender<RebalanceEvent>) -> Self {
        GroupContext {
            events,
            revoked: Mutex::new(CancellationToken::new()),
        }
    }

    /// Arms the revocation token of a new session.
    pub(crate) fn begin_session(&self) -> CancellationToken {
        let token = CancellationToken::new();
        *self.revoked.lock().unwrap_or_else(PoisonError::into_inner) = token.clone();
        token
    }

    fn revoke(&self, partitions: Vec<(String, i32)>) {
        info!("Partitions revoked: {partitions:?}");
        self.revoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        self.publish(RebalanceEvent::Revoked(partitions));
    }

    fn publish(&self, event: RebalanceEvent) {
        if self.events.send(event).is_err() {
            debug!("Rebalance event dropped, the consumer group is gone.");
        }
    }
}

impl ClientContext for GroupContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        forward_log(level, fac, log_message);
    }

    fn error(&self, error: KafkaError, reason: &str) {
        forward_error(error, reason);
    }
}

impl ConsumerContext for GroupContext {
    fn pre_rebalance(&self, _base_consumer: &BaseConsumer<Self>, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Revoke(partitions) => self.revoke(assigned_partitions(partitions)),
            Rebalance::Error(error) => {
                warn!("Rebalance failed: {error}");
                self.publish(RebalanceEvent::Failed(error.clone()));
            }
            Rebalance::Assign(_) => {}
        }
    }

    fn post_rebalance(&self, _base_consumer: &BaseConsumer<Self>, rebalance: &Rebalance<'_>) {
        if let Rebalance::Assign(partitions) = rebalance {
            let partitions = assigned_partitions(partitions);
            info!("Partitions assigned: {partitions:?}");
            self.publish(RebalanceEvent::Assigned(partitions));
        }
    }

    fn commit_callback(&self, result: KafkaResult<()>, offsets: &TopicPartitionList) {
        match result {
            Ok(()) => debug!("Committed offsets: {:?}", offsets.to_topic_map()),
            Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {}
            Err(error) => warn!("Failed to commit offsets: {error}"),
        }
    }
}

pub(crate) fn assigned_partitions(list: &TopicPartitionList) -> Vec<(String, i32)> {
    list.elements()
        .iter()
        .map(|element| (element.topic().to_string(), element.partition()))
        .collect()
}
