use crate::consumer_group::{Claim, ConsumerGroupHandler, GroupSession, ReadySignal};
use crate::error::TickerError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Logs every message of every claim and marks it as processed.
#[derive(Debug, Clone)]
pub struct LoggingHandler {
    ready: Arc<ReadySignal>,
}

impl LoggingHandler {
    pub fn new(ready: Arc<ReadySignal>) -> Self {
        LoggingHandler { ready }
    }
}

#[async_trait]
impl ConsumerGroupHandler for LoggingHandler {
    async fn setup(&self, session: &dyn GroupSession) -> Result<(), TickerError> {
        debug!(
            "Session {} of group: {} has claims: {:?}",
            session.generation(),
            session.group_id(),
            session.claims()
        );
        self.ready.notify();
        Ok(())
    }

    async fn cleanup(&self, _session: &dyn GroupSession) -> Result<(), TickerError> {
        Ok(())
    }

    async fn consume_claim(
        &self,
        session: &dyn GroupSession,
        claim: &mut Claim,
    ) -> Result<(), TickerError> {
        while let Some(message) = claim.next_message().await {
            info!(
                "Message topic:{:?} partition:{} offset:{} key:{} value:{}",
                message.topic,
                message.partition,
                message.offset,
                message.key_lossy(),
                message.value_lossy()
            );
            session.mark_message(&message);
        }
        Ok(())
    }
}
