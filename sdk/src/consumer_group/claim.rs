use crate::message::ConsumerMessage;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A partition assigned to this member for the duration of one session.
#[derive(Debug)]
pub struct Claim {
    topic: String,
    partition: i32,
    messages: mpsc::Receiver<ConsumerMessage>,
    revoked: CancellationToken,
}

impl Claim {
    /// Creates a claim together with the sender feeding it. The claim's stream
    /// ends once the sender is dropped and the buffered messages are drained.
    pub fn channel(
        topic: impl Into<String>,
        partition: i32,
        capacity: usize,
    ) -> (mpsc::Sender<ConsumerMessage>, Claim) {
        let (sender, messages) = mpsc::channel(capacity);
        let claim = Claim {
            topic: topic.into(),
            partition,
            messages,
            revoked: CancellationToken::new(),
        };
        (sender, claim)
    }

    /// Ends the claim as soon as `revoked` is cancelled, discarding whatever
    /// is still buffered: the partition belongs to another member by then.
    pub(crate) fn revoked_by(mut self, revoked: CancellationToken) -> Self {
        self.revoked = revoked;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }

    /// Next message of the claim, in offset order; `None` once the claim is over.
    pub async fn next_message(&mut self) -> Option<ConsumerMessage> {
        tokio::select! {
            biased;
            _ = self.revoked.cancelled() => {
                self.discard();
                None
            }
            message = self.messages.recv() => message,
        }
    }

    fn discard(&mut self) {
        self.messages.close();
        let mut discarded = 0;
        while self.messages.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            debug!(
                "Discarded {discarded} buffered message(s) of revoked topic: {}, partition: {}",
                self.topic, self.partition
            );
        }
    }

    /// Stops accepting new messages; already buffered ones are still returned.
    pub(crate) fn close(&mut self) {
        self.messages.close();
    }
}
