use crate::error::TickerError;
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
pub use tokio_util::sync::CancellationToken;
use tracing::info;

/// Installs SIGINT and SIGTERM handlers and spawns the task that cancels
/// `token` when either arrives. `component` only names the process in the log line.
pub fn cancel_on_signal(
    token: CancellationToken,
    component: &'static str,
) -> Result<JoinHandle<()>, TickerError> {
    let mut interrupt = signal(SignalKind::interrupt()).map_err(TickerError::SignalHandler)?;
    let mut terminate = signal(SignalKind::terminate()).map_err(TickerError::SignalHandler)?;

    Ok(tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
            // Nothing left to listen for once someone else requested shutdown.
            _ = token.cancelled() => return,
        }
        info!("Received shutdown signal. Closing {component}...");
        token.cancel();
    }))
}
