pub mod stdout;
pub mod utils;

use operation_kit_config::log::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::ParseError, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

use crate::logging::stdout::build_stdout_layer;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(#[from] ParseError),
    #[error("a global logger is already installed: {0}")]
    AlreadyInstalled(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the process wide logger.
///
/// The returned guard flushes buffered records when dropped, keep it alive for the
/// lifetime of the process.
pub fn configure_logging(config: &LoggingConfig) -> Result<WorkerGuard, LoggingError> {
    let (layer, guard) = build_stdout_layer::<Registry>(config)?;
    tracing_subscriber::registry().with(layer).try_init()?;

    Ok(guard)
}
