use crate::config::ProducerConfig;
use crate::context::{ensure_reachable, TracingClientContext};
use crate::error::TickerError;
use crate::message::Delivery;
use crate::producer::MessageSender;
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;
use tracing::{debug, info};

/// [`MessageSender`] backed by librdkafka's future producer.
pub struct KafkaSender {
    producer: FutureProducer<TracingClientContext>,
    message_timeout: Duration,
}

impl KafkaSender {
    /// Creates the producer and fetches the topic's metadata, failing when
    /// no broker answers within the configured metadata timeout.
    pub fn new(config: &ProducerConfig) -> Result<Self, TickerError> {
        config.validate()?;
        let producer: FutureProducer<TracingClientContext> = config
            .to_client_config()
            .create_with_context(TracingClientContext)?;
        ensure_reachable(producer.client(), config.broker(), config.topic())?;
        info!(
            "Created producer for brokers: {}",
            config.broker().bootstrap_servers()
        );
        Ok(KafkaSender {
            producer,
            message_timeout: config.message_timeout(),
        })
    }
}

#[async_trait]
impl MessageSender for KafkaSender {
    async fn send(&self, topic: &str, payload: &str) -> Result<Delivery, TickerError> {
        let record: FutureRecord<'_, (), str> = FutureRecord::to(topic).payload(payload);
        match self
            .producer
            .send(record, Timeout::After(self.message_timeout))
            .await
        {
            Ok((partition, offset)) => Ok(Delivery { partition, offset }),
            Err((error, _)) => Err(TickerError::SendFailed(error)),
        }
    }

    async fn close(&self) -> Result<(), TickerError> {
        debug!("Flushing outstanding deliveries...");
        let producer = self.producer.clone();
        let timeout = Timeout::After(self.message_timeout);
        tokio::task::spawn_blocking(move || producer.flush(timeout)).await??;
        Ok(())
    }
}
