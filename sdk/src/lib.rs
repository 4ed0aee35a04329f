pub mod config;
pub mod consumer_group;
pub mod context;
pub mod error;
pub mod logging;
pub mod message;
pub mod producer;
pub mod shutdown;
mod utils;
