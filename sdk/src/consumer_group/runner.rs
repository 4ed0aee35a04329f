use crate::consumer_group::{
    Claim, ConsumerGroup, ConsumerGroupHandler, ConsumerState, GroupSession, ReadySignal,
    StateTracker,
};
use crate::error::TickerError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

const REJOIN_BACKOFF: Duration = Duration::from_secs(1);

/// Keeps a member in its group: one [`ConsumerGroup::consume`] call per
/// session, rejoining after every rebalance until shutdown or close.
pub struct ConsumerGroupRunner {
    group: Arc<dyn ConsumerGroup>,
    handler: Arc<dyn ConsumerGroupHandler>,
    topics: Vec<String>,
    ready: Arc<ReadySignal>,
    state: StateTracker,
}

impl ConsumerGroupRunner {
    pub fn new(
        group: Arc<dyn ConsumerGroup>,
        handler: Arc<dyn ConsumerGroupHandler>,
        topics: Vec<String>,
        ready: Arc<ReadySignal>,
    ) -> Self {
        ConsumerGroupRunner {
            group,
            handler,
            topics,
            ready,
            state: StateTracker::new(),
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state.current()
    }

    /// Runs sessions until `shutdown` is cancelled or the group is closed.
    /// Session errors are logged and followed by a rejoin.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), TickerError> {
        self.state.transition(ConsumerState::Joining)?;
        let handler = StateTrackingHandler {
            inner: self.handler.as_ref(),
            state: &self.state,
        };

        loop {
            if let Err(error) = self.group.consume(&self.topics, &handler, &shutdown).await {
                if error.is_closed() {
                    info!("Consumer group was closed, leaving the consume loop.");
                    self.state.transition(ConsumerState::Closing)?;
                    return Ok(());
                }
                error!("Error from consumer: {error}");
                tokio::select! {
                    _ = shutdown.cancelled() => {}
                    _ = sleep(REJOIN_BACKOFF) => {}
                }
            }

            if shutdown.is_cancelled() {
                self.state.transition(ConsumerState::ShutdownRequested)?;
                return Ok(());
            }

            if self.state.current() == ConsumerState::SessionActive {
                self.state.transition(ConsumerState::Rebalancing)?;
                self.state.transition(ConsumerState::Joining)?;
            }
            self.ready.rearm();
        }
    }

    /// Leaves the group.
    pub async fn close(&self) -> Result<(), TickerError> {
        self.state.transition(ConsumerState::Closing)?;
        self.group.close().await?;
        self.state.transition(ConsumerState::Closed)
    }
}

/// Moves the runner to [`ConsumerState::SessionActive`] before the wrapped
/// handler's setup runs.
struct StateTrackingHandler<'a> {
    inner: &'a dyn ConsumerGroupHandler,
    state: &'a StateTracker,
}

#[async_trait]
impl<'a> ConsumerGroupHandler for StateTrackingHandler<'a> {
    async fn setup(&self, session: &dyn GroupSession) -> Result<(), TickerError> {
        self.state.transition(ConsumerState::SessionActive)?;
        self.inner.setup(session).await
    }

    async fn cleanup(&self, session: &dyn GroupSession) -> Result<(), TickerError> {
        self.inner.cleanup(session).await
    }

    async fn consume_claim(
        &self,
        session: &dyn GroupSession,
        claim: &mut Claim,
    ) -> Result<(), TickerError> {
        self.inner.consume_claim(session, claim).await
    }
}
