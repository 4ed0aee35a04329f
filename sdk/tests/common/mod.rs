use async_trait::async_trait;
use std::sync::Mutex;
use ticker::consumer_group::{Claim, ConsumerGroupHandler, GroupSession};
use ticker::error::TickerError;
use ticker::message::ConsumerMessage;
use ticker::shutdown::CancellationToken;

/// Requests shutdown once the message with the expected value shows up.
/// Either marks everything it receives or only the expected message.
pub struct ExpectingHandler {
    expected: String,
    mark_all: bool,
    found: Mutex<Option<ConsumerMessage>>,
    seen: Mutex<Vec<ConsumerMessage>>,
    shutdown: CancellationToken,
}

impl ExpectingHandler {
    pub fn new(expected: String, shutdown: CancellationToken) -> Self {
        ExpectingHandler {
            expected,
            mark_all: true,
            found: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
            shutdown,
        }
    }

    pub fn marking_only_expected(expected: String, shutdown: CancellationToken) -> Self {
        ExpectingHandler {
            mark_all: false,
            ..Self::new(expected, shutdown)
        }
    }

    pub fn found(&self) -> Option<ConsumerMessage> {
        self.found.lock().unwrap().clone()
    }

    pub fn seen(&self) -> Vec<ConsumerMessage> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConsumerGroupHandler for ExpectingHandler {
    async fn setup(&self, _session: &dyn GroupSession) -> Result<(), TickerError> {
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
            self.seen.lock().unwrap().push(message.clone());
            let expected = message.value_lossy() == self.expected;
            if self.mark_all || expected {
                session.mark_message(&message);
            }
            if expected {
                *self.found.lock().unwrap() = Some(message);
                self.shutdown.cancel();
            }
        }
        Ok(())
    }
}

fn unique_suffix() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

pub fn unique_group_id() -> String {
    format!("ticker-test-{}", unique_suffix())
}

pub fn unique_topic() -> String {
    format!("ticker-test-topic-{}", unique_suffix())
}
