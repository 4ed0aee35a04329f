use crate::config::{BrokerConfig, DEFAULT_TOPIC};
use crate::error::TickerError;
use bon::Builder;
use rdkafka::ClientConfig;
use std::time::Duration;
use strum::{Display, EnumString};

/// Acknowledgement level the leader waits for before answering a produce request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum RequiredAcks {
    #[strum(serialize = "0")]
    NoResponse,
    #[strum(serialize = "1")]
    WaitForLocal,
    #[default]
    #[strum(serialize = "all")]
    WaitForAll,
}

#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct ProducerConfig {
    #[builder(default)]
    broker: BrokerConfig,
    #[builder(default = DEFAULT_TOPIC.to_string())]
    topic: String,
    #[builder(default)]
    required_acks: RequiredAcks,
    #[builder(default = 5)]
    max_retries: u32,
    #[builder(default = true)]
    return_successes: bool,
    #[builder(default = Duration::from_secs(1))]
    send_interval: Duration,
    #[builder(default = Duration::from_secs(30))]
    message_timeout: Duration,
    /// Stop after this many sends; `None` keeps producing until shutdown.
    messages_limit: Option<u64>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ProducerConfig {
    pub fn broker(&self) -> &BrokerConfig {
        &self.broker
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn required_acks(&self) -> RequiredAcks {
        self.required_acks
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn return_successes(&self) -> bool {
        self.return_successes
    }

    pub fn send_interval(&self) -> Duration {
        self.send_interval
    }

    pub fn message_timeout(&self) -> Duration {
        self.message_timeout
    }

    pub fn messages_limit(&self) -> Option<u64> {
        self.messages_limit
    }

    pub fn validate(&self) -> Result<(), TickerError> {
        self.broker.validate()?;
        if self.topic.trim().is_empty() {
            return Err(TickerError::InvalidConfiguration(
                "topic name cannot be empty".to_string(),
            ));
        }

        if self.message_timeout.is_zero() {
            return Err(TickerError::InvalidConfiguration(
                "message timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = self.broker.to_client_config();
        config
            .set("acks", self.required_acks.to_string())
            .set("retries", self.max_retries.to_string())
            .set(
                "delivery.report.only.error",
                (!self.return_successes).to_string(),
            )
            .set(
                "message.timeout.ms",
                self.message_timeout.as_millis().to_string(),
            );
        config
    }
}
