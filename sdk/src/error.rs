use crate::consumer_group::ConsumerState;
use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TickerError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] KafkaError),
    #[error("Failed to deliver message: {0}")]
    SendFailed(KafkaError),
    #[error("Consumer group is closed")]
    ClosedConsumerGroup,
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Invalid consumer state transition from {from} to {to}")]
    InvalidStateTransition {
        from: ConsumerState,
        to: ConsumerState,
    },
    #[error("Cannot reach brokers: {brokers}: {source}")]
    BrokersUnreachable {
        brokers: String,
        #[source]
        source: KafkaError,
    },
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("Cannot install signal handler: {0}")]
    SignalHandler(#[source] std::io::Error),
    #[error("Message handler error: {0}")]
    Handler(String),
    #[error("Cannot initialize logging: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
}

impl TickerError {
    /// Whether the outer consume loop has to stop instead of rejoining the group.
    pub fn is_closed(&self) -> bool {
        matches!(self, TickerError::ClosedConsumerGroup)
    }
}
