use ticker::config::ProducerConfig;
use ticker::error::TickerError;
use ticker::logging::Logging;
use ticker::producer::{produce_messages, KafkaSender, MessageSender};
use ticker::shutdown::{cancel_on_signal, CancellationToken};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), TickerError> {
    let mut logging = Logging::new();
    logging.init()?;

    let config = ProducerConfig::default();
    let sender = KafkaSender::new(&config)
        .inspect_err(|err| error!("Error creating producer: {err}"))?;
    info!(
        "Producer connected to brokers: {}",
        config.broker().bootstrap_servers()
    );

    let shutdown = CancellationToken::new();
    let signals = cancel_on_signal(shutdown.clone(), "producer")?;
    produce_messages(&sender, &config, &shutdown).await;

    if let Err(err) = sender.close().await {
        error!("Error closing producer: {err}");
    }
    shutdown.cancel();
    if let Err(err) = signals.await {
        error!("Signal handler task failed: {err}");
    }
    Ok(())
}
