use std::sync::Arc;
use ticker::config::ConsumerConfig;
use ticker::consumer_group::{ConsumerGroupRunner, KafkaConsumerGroup, LoggingHandler, ReadySignal};
use ticker::error::TickerError;
use ticker::logging::Logging;
use ticker::shutdown::{cancel_on_signal, CancellationToken};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), TickerError> {
    let mut logging = Logging::new();
    logging.init()?;

    let config = ConsumerConfig::default();
    let group = KafkaConsumerGroup::new(&config)
        .inspect_err(|err| error!("Error creating consumer group client: {err}"))?;

    let ready = Arc::new(ReadySignal::new());
    let handler = Arc::new(LoggingHandler::new(ready.clone()));
    let runner = Arc::new(ConsumerGroupRunner::new(
        Arc::new(group),
        handler,
        vec![config.topic().to_string()],
        ready.clone(),
    ));

    let shutdown = CancellationToken::new();
    let signals = cancel_on_signal(shutdown.clone(), "consumer")?;

    let ready_rx = ready.subscribe();
    let mut consuming = tokio::spawn({
        let runner = runner.clone();
        let shutdown = shutdown.clone();
        async move { runner.run(shutdown).await }
    });

    let mut finished = None;
    if let Some(ready) = ready_rx {
        tokio::select! {
            result = ready => if result.is_ok() {
                info!("Consumer is ready");
            },
            result = &mut consuming => finished = Some(result),
        }
    }

    let result = match finished {
        Some(result) => result,
        None => consuming.await,
    };
    match result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!("Error from consumer: {err}"),
        Err(err) => error!("Consumer task failed: {err}"),
    }

    if let Err(err) = runner.close().await {
        error!("Error closing client: {err}");
    }
    shutdown.cancel();
    if let Err(err) = signals.await {
        error!("Signal handler task failed: {err}");
    }
    Ok(())
}
