use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use operation_kit_config::persisted_operations::PersistedOperationsSource;
use serde::Deserialize;
use tracing::{debug, info};

use crate::operation::ClientInfo;

#[derive(Debug, thiserror::Error)]
pub enum PersistedOperationError {
    #[error("persisted operation '{0}' not found")]
    NotFound(String),
    #[error("persisted operation store is unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read persisted operations file: {0}")]
    FileReadError(#[source] std::io::Error),
    #[error("failed to parse persisted operations file: {0}")]
    ParseError(#[source] serde_json::Error),
}

/// Resolves persisted query hashes to operation bodies.
#[async_trait]
pub trait PersistedOperationStore: Send + Sync {
    async fn fetch(
        &self,
        sha256_hash: &str,
        client: &ClientInfo,
    ) -> Result<String, PersistedOperationError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    Apollo { operations: Vec<ApolloOperation> },
    KeyValue(HashMap<String, String>),
}

#[derive(Deserialize)]
struct ApolloOperation {
    id: String,
    body: String,
}

/// Persisted operations loaded once from a JSON file, either a plain
/// `{"<sha256>": "<query>"}` map or an Apollo persisted query manifest.
pub struct FilePersistedOperationStore {
    operations: HashMap<String, String>,
}

impl FilePersistedOperationStore {
    pub fn try_new(source: &PersistedOperationsSource) -> Result<Self, PersistedOperationError> {
        match source {
            PersistedOperationsSource::File { path } => Self::from_path(path.as_path()),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, PersistedOperationError> {
        let content =
            std::fs::read_to_string(path).map_err(PersistedOperationError::FileReadError)?;
        let store = Self::from_json_str(&content)?;
        info!(
            "loaded {} persisted operations from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn from_json_str(content: &str) -> Result<Self, PersistedOperationError> {
        let manifest: ManifestFile =
            serde_json::from_str(content).map_err(PersistedOperationError::ParseError)?;

        let operations = match manifest {
            ManifestFile::Apollo { operations } => operations
                .into_iter()
                .map(|operation| (operation.id.to_ascii_lowercase(), operation.body))
                .collect(),
            ManifestFile::KeyValue(operations) => operations
                .into_iter()
                .map(|(hash, body)| (hash.to_ascii_lowercase(), body))
                .collect(),
        };

        Ok(Self { operations })
    }

    pub fn from_operations(operations: HashMap<String, String>) -> Self {
        Self {
            operations: operations
                .into_iter()
                .map(|(hash, body)| (hash.to_ascii_lowercase(), body))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[async_trait]
impl PersistedOperationStore for FilePersistedOperationStore {
    async fn fetch(
        &self,
        sha256_hash: &str,
        client: &ClientInfo,
    ) -> Result<String, PersistedOperationError> {
        match self.operations.get(&sha256_hash.to_ascii_lowercase()) {
            Some(body) => Ok(body.clone()),
            None => {
                debug!(
                    client_name = client.name.as_str(),
                    "persisted operation {} not found", sha256_hash
                );
                Err(PersistedOperationError::NotFound(sha256_hash.to_string()))
            }
        }
    }
}
