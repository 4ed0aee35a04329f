use crate::error::TickerError;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

const DEFAULT_LOG_FILTER: &str = "INFO";

/// Owns the writer guard of the non-blocking stdout appender; dropping it
/// flushes whatever is still buffered, so keep it alive for the whole `main`.
pub struct Logging {
    stdout_guard: Option<WorkerGuard>,
}

impl Default for Logging {
    fn default() -> Self {
        Self::new()
    }
}

impl Logging {
    pub fn new() -> Self {
        Logging { stdout_guard: None }
    }

    pub fn init(&mut self) -> Result<&mut Self, TickerError> {
        let (stdout_writer, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());
        self.stdout_guard = Some(stdout_guard);

        let stdout_layer = fmt::layer()
            .with_target(false)
            .with_writer(stdout_writer)
            .with_filter(env_filter());

        let subscriber = Registry::default().with(stdout_layer);
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(self)
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}
