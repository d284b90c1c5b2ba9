use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of entries kept by the normalization cache of non-persisted operations.
    #[serde(default = "default_normalization_cache_size")]
    pub normalization_cache_size: u64,

    /// Maximum number of entries kept by the canonical result cache of persisted operations.
    #[serde(default = "default_persisted_operation_cache_size")]
    pub persisted_operation_cache_size: u64,

    /// Maximum number of memoized sha256 hashes of raw query texts.
    #[serde(default = "default_operation_hash_cache_size")]
    pub operation_hash_cache_size: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            normalization_cache_size: default_normalization_cache_size(),
            persisted_operation_cache_size: default_persisted_operation_cache_size(),
            operation_hash_cache_size: default_operation_hash_cache_size(),
        }
    }
}

fn default_normalization_cache_size() -> u64 {
    1024
}

fn default_persisted_operation_cache_size() -> u64 {
    1024
}

fn default_operation_hash_cache_size() -> u64 {
    2048
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct WorkspacePoolConfig {
    /// Number of idle scratch workspaces kept around for reuse.
    /// The pool grows beyond this number under load; extra workspaces are dropped once returned.
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,

    /// Output buffers that grew above this capacity (in bytes) are reallocated instead of being reused.
    #[serde(default = "default_max_retained_buffer_bytes")]
    pub max_retained_buffer_bytes: usize,
}

impl Default for WorkspacePoolConfig {
    fn default() -> Self {
        Self {
            max_idle: default_max_idle(),
            max_retained_buffer_bytes: default_max_retained_buffer_bytes(),
        }
    }
}

fn default_max_idle() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

fn default_max_retained_buffer_bytes() -> usize {
    1024 * 1024
}
