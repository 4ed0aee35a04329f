use crate::error::TickerError;
use bon::Builder;
use rdkafka::ClientConfig;
use std::time::Duration;

pub const DEFAULT_BROKERS: [&str; 3] = ["localhost:29092", "localhost:29093", "localhost:29094"];

/// Connection settings shared by the producer and the consumer.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct BrokerConfig {
    #[builder(default = DEFAULT_BROKERS.iter().map(|broker| broker.to_string()).collect())]
    brokers: Vec<String>,
    #[builder(default = "ticker".to_string())]
    client_id: String,
    /// How long a client may take to fetch cluster metadata when it is created.
    #[builder(default = Duration::from_secs(10))]
    metadata_timeout: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BrokerConfig {
    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn metadata_timeout(&self) -> Duration {
        self.metadata_timeout
    }

    /// Comma separated list in the form expected by `bootstrap.servers`.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }

    pub fn validate(&self) -> Result<(), TickerError> {
        if self.brokers.is_empty() {
            return Err(TickerError::InvalidConfiguration(
                "at least one broker address is required".to_string(),
            ));
        }

        if let Some(broker) = self.brokers.iter().find(|broker| broker.trim().is_empty()) {
            return Err(TickerError::InvalidConfiguration(format!(
                "invalid broker address: '{broker}'"
            )));
        }

        if self.metadata_timeout.is_zero() {
            return Err(TickerError::InvalidConfiguration(
                "metadata timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.bootstrap_servers())
            .set("client.id", &self.client_id);
        config
    }
}
