use crate::consumer_group::kafka::context::GroupContext;
use crate::consumer_group::{GroupSession, MarkedOffsets};
use crate::message::ConsumerMessage;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaResult;
use std::collections::BTreeMap;
use tracing::warn;

/// Receives the offset of the last processed message of a partition.
/// librdkafka stores `offset + 1` itself, which is what gets committed.
pub(crate) trait OffsetStore: Send + Sync {
    fn store_processed(&self, topic: &str, partition: i32, offset: i64) -> KafkaResult<()>;
}

impl OffsetStore for StreamConsumer<GroupContext> {
    fn store_processed(&self, topic: &str, partition: i32, offset: i64) -> KafkaResult<()> {
        self.store_offset(topic, partition, offset)
    }
}

/// Session backed by a live consumer: marks become stored offsets that the
/// background auto-commit picks up.
pub(crate) struct KafkaSession<'a> {
    store: &'a dyn OffsetStore,
    group_id: &'a str,
    generation: u64,
    claims: BTreeMap<String, Vec<i32>>,
    offsets: MarkedOffsets,
}

impl<'a> KafkaSession<'a> {
    pub(crate) fn new(
        store: &'a dyn OffsetStore,
        group_id: &'a str,
        generation: u64,
        assigned: &[(String, i32)],
    ) -> Self {
        let mut claims: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        for (topic, partition) in assigned {
            claims.entry(topic.clone()).or_default().push(*partition);
        }
        for partitions in claims.values_mut() {
            partitions.sort_unstable();
        }

        KafkaSession {
            store,
            group_id,
            generation,
            claims,
            offsets: MarkedOffsets::default(),
        }
    }
}

impl GroupSession for KafkaSession<'_> {
    fn group_id(&self) -> &str {
        self.group_id
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    fn claims(&self) -> &BTreeMap<String, Vec<i32>> {
        &self.claims
    }

    fn mark_message(&self, message: &ConsumerMessage) {
        if self
            .offsets
            .mark(&message.topic, message.partition, message.offset)
            .is_none()
        {
            return;
        }

        if let Err(error) =
            self.store
                .store_processed(&message.topic, message.partition, message.offset)
        {
            warn!(
                "Failed to store offset: {} for topic: {}, partition: {}: {error}",
                message.offset, message.topic, message.partition
            );
        }
    }
}
