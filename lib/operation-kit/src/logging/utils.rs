use operation_kit_config::log::LoggingConfig;
use tracing_subscriber::{filter::ParseError, EnvFilter, Layer};

/// Filter built from `log.filter`, or from `log.level` when no filter is set.
pub fn create_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(config.env_filter_str())
}

pub type DynLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;
