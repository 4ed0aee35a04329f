mod kafka_sender;

pub use kafka_sender::KafkaSender;

use crate::config::ProducerConfig;
use crate::error::TickerError;
use crate::message::Delivery;
use async_trait::async_trait;
use chrono::{DateTime, Local, SecondsFormat, TimeZone};
use std::fmt::Display;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Synchronous publishing capability: `send` resolves once the broker has
/// acknowledged (or rejected) the message.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, topic: &str, payload: &str) -> Result<Delivery, TickerError>;

    /// Waits for outstanding deliveries before the sender goes away.
    async fn close(&self) -> Result<(), TickerError>;
}

/// Builds the payload of the `counter`-th message, e.g. `Message 0 - 2024-01-02T03:04:05+01:00`.
pub fn format_message<Tz>(counter: u64, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "Message {counter} - {}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Sends one message per `send_interval` until `shutdown` is cancelled (or the
/// configured limit is reached) and returns how many sends were attempted.
/// Failed sends are logged and skipped.
pub async fn produce_messages(
    sender: &dyn MessageSender,
    config: &ProducerConfig,
    shutdown: &CancellationToken,
) -> u64 {
    info!(
        "Messages will be sent to topic: {} with interval {} ms.",
        config.topic(),
        config.send_interval().as_millis()
    );

    let mut counter = 0;
    loop {
        if shutdown.is_cancelled() {
            info!("Producer stopped after {counter} message(s).");
            return counter;
        }

        if config.messages_limit().is_some_and(|limit| counter >= limit) {
            info!("Sent {counter} message(s), exiting.");
            return counter;
        }

        let payload = format_message(counter, Local::now());
        match sender.send(config.topic(), &payload).await {
            Ok(delivery) => info!(
                "Message sent successfully! Partition: {}, Offset: {}",
                delivery.partition, delivery.offset
            ),
            Err(err) => error!("Failed to send message: {err}"),
        }

        counter += 1;
        tokio::select! {
            _ = shutdown.cancelled() => {}
            _ = sleep(config.send_interval()) => {}
        }
    }
}
