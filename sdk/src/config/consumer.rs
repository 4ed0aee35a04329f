use crate::config::{BrokerConfig, DEFAULT_GROUP_ID, DEFAULT_TOPIC};
use crate::error::TickerError;
use bon::Builder;
use rdkafka::ClientConfig;
use strum::{Display, EnumString};

/// Partition assignment strategy used by the group leader.
///
/// Only eager strategies are offered: every rebalance revokes the whole
/// assignment, which is what the session model relies on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AssignmentStrategy {
    Range,
    #[default]
    RoundRobin,
}

/// Where to start when the group has no committed offset for a partition.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum InitialOffset {
    #[strum(serialize = "earliest")]
    Oldest,
    #[default]
    #[strum(serialize = "latest")]
    Newest,
}

#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(on(String, into))]
pub struct ConsumerConfig {
    #[builder(default)]
    broker: BrokerConfig,
    #[builder(default = DEFAULT_TOPIC.to_string())]
    topic: String,
    #[builder(default = DEFAULT_GROUP_ID.to_string())]
    group_id: String,
    #[builder(default)]
    assignment_strategy: AssignmentStrategy,
    #[builder(default)]
    initial_offset: InitialOffset,
    /// Capacity of every claim's message channel.
    #[builder(default = 256)]
    claim_buffer_size: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ConsumerConfig {
    pub fn broker(&self) -> &BrokerConfig {
        &self.broker
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn assignment_strategy(&self) -> AssignmentStrategy {
        self.assignment_strategy
    }

    pub fn initial_offset(&self) -> InitialOffset {
        self.initial_offset
    }

    pub fn claim_buffer_size(&self) -> usize {
        self.claim_buffer_size
    }

    pub fn validate(&self) -> Result<(), TickerError> {
        self.broker.validate()?;
        if self.topic.trim().is_empty() {
            return Err(TickerError::InvalidConfiguration(
                "topic name cannot be empty".to_string(),
            ));
        }

        if self.group_id.trim().is_empty() {
            return Err(TickerError::InvalidConfiguration(
                "consumer group id cannot be empty".to_string(),
            ));
        }

        if self.claim_buffer_size == 0 {
            return Err(TickerError::InvalidConfiguration(
                "claim buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn to_client_config(&self) -> ClientConfig {
        let mut config = self.broker.to_client_config();
        config
            .set("group.id", &self.group_id)
            .set(
                "partition.assignment.strategy",
                self.assignment_strategy.to_string(),
            )
            .set("auto.offset.reset", self.initial_offset.to_string())
            // Offsets are stored when a message is marked and committed in the background.
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("enable.partition.eof", "false");
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn should_be_default() {
        let config = ConsumerConfig::default();
        assert_eq!(config.topic(), "test-topic");
        assert_eq!(config.group_id(), "test-consumer-group");
        assert_eq!(config.assignment_strategy(), AssignmentStrategy::RoundRobin);
        assert_eq!(config.initial_offset(), InitialOffset::Newest);
        assert_eq!(config.claim_buffer_size(), 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_render_client_config() {
        let config = ConsumerConfig::default().to_client_config();
        assert_eq!(config.get("group.id"), Some("test-consumer-group"));
        assert_eq!(config.get("partition.assignment.strategy"), Some("roundrobin"));
        assert_eq!(config.get("auto.offset.reset"), Some("latest"));
        assert_eq!(config.get("enable.auto.commit"), Some("true"));
        assert_eq!(config.get("enable.auto.offset.store"), Some("false"));
    }

    #[test]
    fn should_be_built() {
        let config = ConsumerConfig::builder()
            .group_id("audit")
            .assignment_strategy(AssignmentStrategy::Range)
            .initial_offset(InitialOffset::Oldest)
            .build();
        let client_config = config.to_client_config();
        assert_eq!(client_config.get("group.id"), Some("audit"));
        assert_eq!(client_config.get("partition.assignment.strategy"), Some("range"));
        assert_eq!(client_config.get("auto.offset.reset"), Some("earliest"));
    }

    #[test]
    fn should_reject_invalid_values() {
        assert!(ConsumerConfig::builder().group_id(" ").build().validate().is_err());
        assert!(ConsumerConfig::builder().topic("").build().validate().is_err());
        assert!(ConsumerConfig::builder()
            .claim_buffer_size(0)
            .build()
            .validate()
            .is_err());
    }

    #[test]
    fn strategy_should_parse_librdkafka_names() {
        assert_eq!(
            AssignmentStrategy::from_str("roundrobin").unwrap(),
            AssignmentStrategy::RoundRobin
        );
        assert_eq!(InitialOffset::from_str("earliest").unwrap(), InitialOffset::Oldest);
        assert!(AssignmentStrategy::from_str("sticky").is_err());
    }
}
