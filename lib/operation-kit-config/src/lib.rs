pub mod cache;
pub mod cache_warmup;
mod env_overrides;
pub mod limits;
pub mod log;
pub mod normalization;
pub mod persisted_operations;
pub mod primitives;

use config::{Config, File, FileFormat, FileSourceFile};
use envconfig::Envconfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::path::{Path, PathBuf};

use crate::{
    cache::{CacheConfig, WorkspacePoolConfig},
    cache_warmup::CacheWarmupConfig,
    env_overrides::{EnvVarOverrides, EnvVarOverridesError},
    limits::LimitsConfig,
    log::LoggingConfig,
    normalization::{CompatibilityConfig, IntrospectionConfig, NormalizationConfig},
    persisted_operations::PersistedOperationsConfig,
    primitives::file_path::with_start_path,
};

#[derive(Debug, Default, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OperationKitConfig {
    #[serde(skip)]
    root_directory: PathBuf,

    /// The logger configuration.
    #[serde(default)]
    pub log: LoggingConfig,

    /// Size limits applied while decoding and normalizing requests.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Sizing of the scratch workspace pool used by canonicalization.
    #[serde(default)]
    pub workspace_pool: WorkspacePoolConfig,

    /// Capacities of the canonicalization caches.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Normalization behavior.
    #[serde(default)]
    pub normalization: NormalizationConfig,

    /// Configuration to enable or disable introspection queries.
    #[serde(default)]
    pub introspection: IntrospectionConfig,

    /// Persisted operations (automatic persisted queries) configuration.
    #[serde(default)]
    pub persisted_operations: PersistedOperationsConfig,

    /// Switches for behavior expected by older clients.
    #[serde(default)]
    pub compatibility: CompatibilityConfig,

    /// Cache warmup executed before traffic is accepted.
    #[serde(default)]
    pub cache_warmup: CacheWarmupConfig,
}

impl OperationKitConfig {
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OperationKitConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to load the environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
    #[error("Failed to get the current directory: {0}")]
    CurrentDirError(std::io::Error),
    #[error("Failed to parse the configuration file path: {0}")]
    ConfigPathParseError(Infallible),
    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

static DEFAULT_FILE_NAMES: &[&str] = &[
    "operation-kit.config.yaml",
    "operation-kit.config.yml",
    "operation-kit.config.json",
    "operation-kit.config.json5",
];

fn get_current_dir() -> Result<PathBuf, OperationKitConfigError> {
    std::env::current_dir().map_err(OperationKitConfigError::CurrentDirError)
}

fn validate(config: &OperationKitConfig) -> Result<(), OperationKitConfigError> {
    if config.cache_warmup.workers == 0 {
        return Err(OperationKitConfigError::InvalidValue(
            "cache_warmup.workers must be greater than zero".to_string(),
        ));
    }
    if config.persisted_operations.enabled && config.persisted_operations.source.is_none() {
        return Err(OperationKitConfigError::InvalidValue(
            "persisted_operations.source is required when persisted operations are enabled"
                .to_string(),
        ));
    }
    Ok(())
}

pub fn load_config(
    override_config_path: Option<String>,
) -> Result<OperationKitConfig, OperationKitConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    let mut config = Config::builder();
    let mut config_root_path = get_current_dir()?;

    if let Some(path_str) = override_config_path {
        let path_buf = path_str
            .parse::<PathBuf>()
            .map_err(OperationKitConfigError::ConfigPathParseError)?;
        if let Some(parent_dir) = path_buf.parent() {
            config_root_path = config_root_path.join(parent_dir);
        }
        let as_file: File<FileSourceFile, _> = path_buf.into();
        config = config.add_source(as_file.required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            config = config.add_source(File::with_name(name).required(false));
        }
    }

    config = env_overrides.apply_overrides(config)?;

    let mut base_cfg = with_start_path(&config_root_path, || {
        config.build()?.try_deserialize::<OperationKitConfig>()
    })?;

    base_cfg.root_directory = config_root_path;
    validate(&base_cfg)?;

    Ok(base_cfg)
}

pub fn parse_yaml_config(config_raw: String) -> Result<OperationKitConfig, OperationKitConfigError> {
    parse_yaml_config_at(&get_current_dir()?, &config_raw)
}

/// Parses a YAML config, resolving relative paths against `root`.
pub fn parse_yaml_config_at(
    root: &Path,
    config_raw: &str,
) -> Result<OperationKitConfig, OperationKitConfigError> {
    let mut parsed = with_start_path(root, || {
        Config::builder()
            .add_source(File::from_str(config_raw, FileFormat::Yaml))
            .build()?
            .try_deserialize::<OperationKitConfig>()
    })?;

    parsed.root_directory = root.to_path_buf();
    validate(&parsed)?;

    Ok(parsed)
}
