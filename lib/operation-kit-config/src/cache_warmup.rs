use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::primitives::file_path::FilePath;

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CacheWarmupConfig {
    /// Whether the caches are pre-populated before traffic is served.
    ///
    /// Can also be set via the `CACHE_WARMUP_ENABLED` environment variable.
    #[serde(default)]
    pub enabled: bool,

    /// Number of concurrent workers processing warmup items.
    ///
    /// Can also be set via the `CACHE_WARMUP_WORKERS` environment variable.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Upper bound on the number of items started per second, across all workers.
    ///
    /// Can also be set via the `CACHE_WARMUP_ITEMS_PER_SECOND` environment variable.
    #[serde(default = "default_items_per_second")]
    pub items_per_second: u64,

    /// Overall deadline of the warmup run.
    ///
    /// Can also be set via the `CACHE_WARMUP_TIMEOUT` environment variable.
    #[serde(
        default = "default_timeout",
        deserialize_with = "humantime_serde::deserialize",
        serialize_with = "humantime_serde::serialize"
    )]
    #[schemars(with = "String")]
    pub timeout: Duration,

    /// Where warmup items are loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CacheWarmupSource>,
}

impl Default for CacheWarmupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            workers: default_workers(),
            items_per_second: default_items_per_second(),
            timeout: default_timeout(),
            source: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone)]
#[serde(deny_unknown_fields)]
pub enum CacheWarmupSource {
    #[serde(rename = "filesystem")]
    Filesystem {
        /// Directory holding `.json` warmup manifests and plain `.graphql` / `.gql` operations.
        path: FilePath,
    },
}

fn default_workers() -> usize {
    8
}

fn default_items_per_second() -> u64 {
    50
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}
