use crate::consumer_group::{
    Claim, ConsumerGroup, ConsumerGroupHandler, GroupSession, MarkedOffsets,
};
use crate::error::TickerError;
use crate::message::ConsumerMessage;
use async_trait::async_trait;
use futures::future::join_all;
use rdkafka::error::KafkaError;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub(crate) const TOPIC: &str = "test-topic";

pub(crate) fn message(partition: i32, offset: i64) -> ConsumerMessage {
    ConsumerMessage {
        topic: TOPIC.to_string(),
        partition,
        offset,
        key: Some(format!("key-{offset}").into_bytes()),
        value: Some(format!("Message {offset} - 2024-01-02T03:04:05Z").into_bytes()),
        timestamp: None,
    }
}

/// Session that remembers every message whose mark advanced the offset.
pub(crate) struct RecordingSession {
    generation: u64,
    claims: BTreeMap<String, Vec<i32>>,
    offsets: MarkedOffsets,
    marked: Mutex<Vec<(String, i32, i64)>>,
}

impl RecordingSession {
    pub(crate) fn new(generation: u64, claims: &[(&str, i32)]) -> Self {
        let mut by_topic: BTreeMap<String, Vec<i32>> = BTreeMap::new();
        for (topic, partition) in claims {
            by_topic.entry(topic.to_string()).or_default().push(*partition);
        }
        RecordingSession {
            generation,
            claims: by_topic,
            offsets: MarkedOffsets::default(),
            marked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn marked(&self) -> Vec<(String, i32, i64)> {
        self.marked.lock().unwrap().clone()
    }
}

impl GroupSession for RecordingSession {
    fn group_id(&self) -> &str {
        "test-consumer-group"
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
            .is_some()
        {
            self.marked.lock().unwrap().push((
                message.topic.clone(),
                message.partition,
                message.offset,
            ));
        }
    }
}

/// What the next call to [`FakeGroup::consume`] does.
pub(crate) enum Step {
    /// Runs a session whose claims hold the given offsets, per partition.
    Session(Vec<(i32, Vec<i64>)>),
    Fail,
    Close,
    /// Cancels the shutdown token, as a signal would.
    Shutdown,
}

/// Scripted group: once the script runs out it behaves like a member that
/// never gets an assignment and only returns on shutdown.
pub(crate) struct FakeGroup {
    steps: Mutex<VecDeque<Step>>,
    generation: AtomicU64,
    closed: AtomicBool,
    marked: Mutex<Vec<(String, i32, i64)>>,
}

impl FakeGroup {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        FakeGroup {
            steps: Mutex::new(steps.into()),
            generation: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            marked: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sessions(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn marked(&self) -> Vec<(String, i32, i64)> {
        self.marked.lock().unwrap().clone()
    }

    async fn run_session(
        &self,
        partitions: Vec<(i32, Vec<i64>)>,
        handler: &dyn ConsumerGroupHandler,
    ) -> Result<(), TickerError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let assigned: Vec<(&str, i32)> = partitions.iter().map(|(p, _)| (TOPIC, *p)).collect();
        let session = RecordingSession::new(generation, &assigned);

        let mut claims = Vec::new();
        for (partition, offsets) in partitions {
            let (sender, claim) = Claim::channel(TOPIC, partition, offsets.len().max(1));
            for offset in offsets {
                sender.try_send(message(partition, offset)).unwrap();
            }
            claims.push(claim);
        }

        handler.setup(&session).await?;
        let session_ref: &dyn GroupSession = &session;
        let results = join_all(
            claims
                .iter_mut()
                .map(|claim| handler.consume_claim(session_ref, claim)),
        )
        .await;
        handler.cleanup(&session).await?;

        self.marked.lock().unwrap().extend(session.marked());
        results.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(())
    }
}

#[async_trait]
impl ConsumerGroup for FakeGroup {
    async fn consume(
        &self,
        _topics: &[String],
        handler: &dyn ConsumerGroupHandler,
        shutdown: &CancellationToken,
    ) -> Result<(), TickerError> {
        if self.is_closed() {
            return Err(TickerError::ClosedConsumerGroup);
        }

        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Session(partitions)) => self.run_session(partitions, handler).await,
            Some(Step::Fail) => Err(TickerError::Kafka(KafkaError::Subscription(
                TOPIC.to_string(),
            ))),
            Some(Step::Close) => {
                self.closed.store(true, Ordering::SeqCst);
                Err(TickerError::ClosedConsumerGroup)
            }
            Some(Step::Shutdown) => {
                shutdown.cancel();
                Ok(())
            }
            None => {
                shutdown.cancelled().await;
                Ok(())
            }
        }
    }

    async fn close(&self) -> Result<(), TickerError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}
