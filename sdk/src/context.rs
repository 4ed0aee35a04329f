use crate::config::BrokerConfig;
use crate::error::TickerError;
use rdkafka::client::Client;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::error::KafkaError;
use rdkafka::util::Timeout;
use rdkafka::ClientContext;
use tracing::{debug, error, info, warn};

/// Client context that routes librdkafka's internal log lines and errors
/// into `tracing` instead of the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingClientContext;

impl ClientContext for TracingClientContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        forward_log(level, fac, log_message);
    }

    fn error(&self, error: KafkaError, reason: &str) {
        forward_error(error, reason);
    }
}

pub(crate) fn forward_log(level: RDKafkaLogLevel, fac: &str, log_message: &str) {
    match level {
        RDKafkaLogLevel::Emerg
        | RDKafkaLogLevel::Alert
        | RDKafkaLogLevel::Critical
        | RDKafkaLogLevel::Error => error!(target: "librdkafka", "{fac}: {log_message}"),
        RDKafkaLogLevel::Warning => warn!(target: "librdkafka", "{fac}: {log_message}"),
        RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => {
            info!(target: "librdkafka", "{fac}: {log_message}")
        }
        RDKafkaLogLevel::Debug => debug!(target: "librdkafka", "{fac}: {log_message}"),
    }
}

pub(crate) fn forward_error(error: KafkaError, reason: &str) {
    error!(target: "librdkafka", "Kafka client error: {error}, reason: {reason}");
}

/// Fetches metadata for `topic` so that a cluster which cannot be reached
/// fails client creation instead of every later request.
pub(crate) fn ensure_reachable<C: ClientContext>(
    client: &Client<C>,
    broker: &BrokerConfig,
    topic: &str,
) -> Result<(), TickerError> {
    let metadata = client
        .fetch_metadata(Some(topic), Timeout::After(broker.metadata_timeout()))
        .map_err(|source| TickerError::BrokersUnreachable {
            brokers: broker.bootstrap_servers(),
            source,
        })?;
    debug!(
        "Fetched metadata of {} broker(s) for topic: {topic}",
        metadata.brokers().len()
    );
    Ok(())
}
