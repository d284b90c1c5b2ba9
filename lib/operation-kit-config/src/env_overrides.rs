use config::{builder::BuilderState, ConfigBuilder, ConfigError};
use envconfig::Envconfig;
use tracing::debug;

use crate::log::{LogFormat, LogLevel};

#[derive(Envconfig)]
pub struct EnvVarOverrides {
    // Logger overrides
    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,
    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
    #[envconfig(from = "LOG_FILTER")]
    pub log_filter: Option<String>,

    // Limits
    #[envconfig(from = "MAX_REQUEST_BODY_SIZE")]
    pub max_request_body_size: Option<u64>,

    // Persisted operations
    #[envconfig(from = "PERSISTED_OPERATIONS_FILE_PATH")]
    pub persisted_operations_file_path: Option<String>,

    // Cache warmup
    #[envconfig(from = "CACHE_WARMUP_ENABLED")]
    pub cache_warmup_enabled: Option<bool>,
    #[envconfig(from = "CACHE_WARMUP_WORKERS")]
    pub cache_warmup_workers: Option<u64>,
    #[envconfig(from = "CACHE_WARMUP_ITEMS_PER_SECOND")]
    pub cache_warmup_items_per_second: Option<u64>,
    #[envconfig(from = "CACHE_WARMUP_TIMEOUT")]
    pub cache_warmup_timeout: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override configuration: {0}")]
    FailedToOverrideConfig(#[from] ConfigError),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(&'static str, String),
}

impl EnvVarOverrides {
    pub fn apply_overrides<T: BuilderState>(
        mut self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(log_level) = self.log_level.take() {
            debug!("[config-override] 'log.level' = {:?}", log_level);
            config = config.set_override("log.level", log_level.as_str())?;
        }
        if let Some(log_format) = self.log_format.take() {
            debug!("[config-override] 'log.format' = {:?}", log_format);
            config = config.set_override("log.format", log_format.as_str())?;
        }
        if let Some(log_filter) = self.log_filter.take() {
            debug!("[config-override] 'log.filter' = {:?}", log_filter);
            config = config.set_override("log.filter", log_filter)?;
        }

        if let Some(size) = self.max_request_body_size.take() {
            debug!("[config-override] 'limits.max_request_body_size' = {}", size);
            config = config.set_override("limits.max_request_body_size", size)?;
        }

        if let Some(path) = self.persisted_operations_file_path.take() {
            debug!("[config-override] 'persisted_operations.source.file.path' = {}", path);
            config = config.set_override("persisted_operations.enabled", true)?;
            config = config.set_override("persisted_operations.source.file.path", path)?;
        }

        if let Some(enabled) = self.cache_warmup_enabled.take() {
            debug!("[config-override] 'cache_warmup.enabled' = {}", enabled);
            config = config.set_override("cache_warmup.enabled", enabled)?;
        }
        if let Some(workers) = self.cache_warmup_workers.take() {
            if workers == 0 {
                return Err(EnvVarOverridesError::InvalidValue(
                    "CACHE_WARMUP_WORKERS",
                    "must be greater than zero".to_string(),
                ));
            }
            debug!("[config-override] 'cache_warmup.workers' = {}", workers);
            config = config.set_override("cache_warmup.workers", workers)?;
        }
        if let Some(rate) = self.cache_warmup_items_per_second.take() {
            debug!("[config-override] 'cache_warmup.items_per_second' = {}", rate);
            config = config.set_override("cache_warmup.items_per_second", rate)?;
        }
        if let Some(timeout) = self.cache_warmup_timeout.take() {
            humantime::parse_duration(&timeout).map_err(|err| {
                EnvVarOverridesError::InvalidValue("CACHE_WARMUP_TIMEOUT", err.to_string())
            })?;
            debug!("[config-override] 'cache_warmup.timeout' = {}", timeout);
            config = config.set_override("cache_warmup.timeout", timeout)?;
        }

        Ok(config)
    }
}
