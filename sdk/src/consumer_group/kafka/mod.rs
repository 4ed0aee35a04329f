mod context;
mod session;

use crate::config::ConsumerConfig;
use crate::context::ensure_reachable;
use crate::consumer_group::{Claim, ConsumerGroup, ConsumerGroupHandler, GroupSession};
use crate::error::TickerError;
use crate::message::ConsumerMessage;
use async_trait::async_trait;
use context::{GroupContext, RebalanceEvent};
use futures::future::join_all;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, KafkaResult};
use rdkafka::types::RDKafkaErrorCode;
use session::KafkaSession;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use strum::Display;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type Routes = HashMap<(String, i32), mpsc::Sender<ConsumerMessage>>;

#[derive(Debug, Display)]
#[strum(serialize_all = "snake_case")]
enum SessionEnd {
    Shutdown,
    Revoked,
    Failed(KafkaError),
    Closed,
}

/// [`ConsumerGroup`] over an rdkafka [`StreamConsumer`].
///
/// Group membership, heartbeats and offset commits are handled by librdkafka.
/// Rebalance callbacks arrive through [`GroupContext`] and delimit sessions:
/// an assignment starts one, a revocation ends it.
pub struct KafkaConsumerGroup {
    consumer: Arc<StreamConsumer<GroupContext>>,
    events: tokio::sync::Mutex<mpsc::UnboundedReceiver<RebalanceEvent>>,
    group_id: String,
    claim_buffer_size: usize,
    generation: AtomicU64,
    subscribed: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl KafkaConsumerGroup {
    /// Creates the consumer and fetches the topic's metadata, failing when
    /// no broker answers within the configured metadata timeout.
    pub fn new(config: &ConsumerConfig) -> Result<Self, TickerError> {
        config.validate()?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let consumer: StreamConsumer<GroupContext> = config
            .to_client_config()
            .create_with_context(GroupContext::new(sender))?;
        ensure_reachable(consumer.client(), config.broker(), config.topic())?;
        info!(
            "Created consumer for group: {}, brokers: {}",
            config.group_id(),
            config.broker().bootstrap_servers()
        );

        Ok(KafkaConsumerGroup {
            consumer: Arc::new(consumer),
            events: tokio::sync::Mutex::new(receiver),
            group_id: config.group_id().to_string(),
            claim_buffer_size: config.claim_buffer_size(),
            generation: AtomicU64::new(0),
            subscribed: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    fn subscribe(&self, topics: &[String]) -> Result<(), TickerError> {
        let mut subscribed = self.subscribed.lock().unwrap_or_else(PoisonError::into_inner);
        if subscribed.as_slice() == topics {
            return Ok(());
        }

        let names: Vec<&str> = topics.iter().map(String::as_str).collect();
        self.consumer.subscribe(&names)?;
        info!("Subscribed to topics: {names:?} in group: {}", self.group_id);
        *subscribed = topics.to_vec();
        Ok(())
    }

    /// Moves messages from the consumer into their claims until the session ends.
    /// Dropping `routes` on return closes every claim; a revocation also makes
    /// the claims drop what they still buffer.
    async fn dispatch(
        &self,
        mut routes: Routes,
        pending: Vec<ConsumerMessage>,
        events: &mut mpsc::UnboundedReceiver<RebalanceEvent>,
        revoked: &CancellationToken,
        shutdown: &CancellationToken,
    ) -> SessionEnd {
        for message in pending {
            tokio::select! {
                _ = shutdown.cancelled() => return SessionEnd::Shutdown,
                _ = route(&mut routes, message) => {}
            }
        }

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return SessionEnd::Shutdown,
                event = events.recv() => match event {
                    Some(RebalanceEvent::Revoked(partitions)) => {
                        debug!("Ending session, revoked partitions: {partitions:?}");
                        revoked.cancel();
                        return SessionEnd::Revoked;
                    }
                    Some(RebalanceEvent::Failed(error)) => return SessionEnd::Failed(error),
                    Some(RebalanceEvent::Assigned(partitions)) => {
                        debug!("Ignoring assignment of: {partitions:?} during an active session.");
                    }
                    None => return SessionEnd::Closed,
                },
                message = recv_detached(&self.consumer) => match message {
                    Ok(message) => tokio::select! {
                        _ = shutdown.cancelled() => return SessionEnd::Shutdown,
                        _ = route(&mut routes, message) => {}
                    },
                    Err(error) => warn!("Error while consuming messages: {error}"),
                },
            }
        }
    }
}

#[async_trait]
impl ConsumerGroup for KafkaConsumerGroup {
    async fn consume(
        &self,
        topics: &[String],
        handler: &dyn ConsumerGroupHandler,
        shutdown: &CancellationToken,
    ) -> Result<(), TickerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TickerError::ClosedConsumerGroup);
        }

        self.subscribe(topics)?;
        let mut events = self.events.lock().await;

        // Messages can be fetched before the assignment event is seen.
        let mut pending = Vec::new();
        let assigned = loop {
            tokio::select! {
                _ = shutdown.cancelled() => return Ok(()),
                event = events.recv() => match event {
                    Some(RebalanceEvent::Assigned(partitions)) if !partitions.is_empty() => break partitions,
                    Some(RebalanceEvent::Assigned(_)) => {
                        debug!("Joined group: {} without partitions, waiting for a rebalance.", self.group_id);
                    }
                    Some(RebalanceEvent::Revoked(_)) => pending.clear(),
                    Some(RebalanceEvent::Failed(error)) => return Err(error.into()),
                    None => return Err(TickerError::ClosedConsumerGroup),
                },
                message = recv_detached(&self.consumer) => match message {
                    Ok(message) => pending.push(message),
                    Err(error) => warn!("Error while joining group: {}: {error}", self.group_id),
                },
            }
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let revoked = self.consumer.context().begin_session();
        let session = KafkaSession::new(
            self.consumer.as_ref(),
            &self.group_id,
            generation,
            &assigned,
        );
        let mut routes = Routes::new();
        let mut claims = Vec::with_capacity(assigned.len());
        for (topic, partition) in &assigned {
            let (sender, claim) = Claim::channel(topic, *partition, self.claim_buffer_size);
            routes.insert((topic.clone(), *partition), sender);
            claims.push(claim.revoked_by(revoked.clone()));
        }

        info!("Session {generation} of group: {} started.", self.group_id);
        handler.setup(&session).await?;

        let session_ref: &dyn GroupSession = &session;
        let claims_done = join_all(claims.iter_mut().map(|claim| async move {
            let result = handler.consume_claim(session_ref, claim).await;
            claim.close();
            result
        }));
        let (results, end) = tokio::join!(
            claims_done,
            self.dispatch(routes, pending, &mut events, &revoked, shutdown)
        );

        info!("Session {generation} of group: {} ended: {end}", self.group_id);
        handler.cleanup(&session).await?;
        for result in results {
            result?;
        }

        match end {
            SessionEnd::Shutdown | SessionEnd::Revoked => Ok(()),
            SessionEnd::Failed(error) => Err(error.into()),
            SessionEnd::Closed => Err(TickerError::ClosedConsumerGroup),
        }
    }

    async fn close(&self) -> Result<(), TickerError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let consumer = self.consumer.clone();
        let committed =
            tokio::task::spawn_blocking(move || consumer.commit_consumer_state(CommitMode::Sync))
                .await?;
        match committed {
            Ok(()) | Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {}
            Err(error) => warn!("Failed to commit offsets on close: {error}"),
        }
        self.consumer.unsubscribe();
        info!("Left consumer group: {}", self.group_id);
        Ok(())
    }
}

/// Receives the next message and copies it out of the consumer's buffer,
/// so no borrowed message outlives this call.
async fn recv_detached(consumer: &StreamConsumer<GroupContext>) -> KafkaResult<ConsumerMessage> {
    consumer
        .recv()
        .await
        .map(|message| ConsumerMessage::from(&message))
}

/// Hands `message` to its claim. Messages of partitions without an open claim
/// are dropped; a claim whose consumer stopped reading is forgotten.
async fn route(routes: &mut Routes, message: ConsumerMessage) {
    let key = (message.topic.clone(), message.partition);
    let Some(sender) = routes.get(&key) else {
        debug!(
            "Dropping message at offset: {} of unclaimed topic: {}, partition: {}",
            message.offset, key.0, key.1
        );
        return;
    };

    if sender.send(message).await.is_err() {
        debug!("Claim for topic: {}, partition: {} was closed.", key.0, key.1);
        routes.remove(&key);
    }
}
