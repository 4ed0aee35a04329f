mod broker;
mod consumer;
mod producer;

pub use broker::{BrokerConfig, BrokerConfigBuilder, DEFAULT_BROKERS};
pub use consumer::{AssignmentStrategy, ConsumerConfig, ConsumerConfigBuilder, InitialOffset};
pub use producer::{ProducerConfig, ProducerConfigBuilder, RequiredAcks};

pub const DEFAULT_TOPIC: &str = "test-topic";
pub const DEFAULT_GROUP_ID: &str = "test-consumer-group";
