use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use operation_kit_config::cache_warmup::CacheWarmupSource;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::operation::ClientInfo;
use crate::warmup::WarmupItem;

#[derive(Debug, thiserror::Error)]
pub enum WarmupSourceError {
    #[error("failed to read warmup directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Supplies the operations replayed by a warmup run.
#[async_trait]
pub trait WarmupSource: Send + Sync {
    async fn load_items(&self) -> Result<Vec<WarmupItem>, WarmupSourceError>;
}

/// A fixed list of items.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    items: Vec<WarmupItem>,
}

impl InMemorySource {
    pub fn new(items: Vec<WarmupItem>) -> Self {
        Self { items }
    }
}

impl From<Vec<WarmupItem>> for InMemorySource {
    fn from(items: Vec<WarmupItem>) -> Self {
        Self::new(items)
    }
}

#[async_trait]
impl WarmupSource for InMemorySource {
    async fn load_items(&self) -> Result<Vec<WarmupItem>, WarmupSourceError> {
        Ok(self.items.clone())
    }
}

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    operations: Vec<ManifestOperation>,
}

#[derive(Deserialize)]
struct ManifestOperation {
    request: Value,
    #[serde(default)]
    client: ClientInfo,
}

/// Reads the files of one directory, in file name order.
///
/// `*.json` files hold `{"operations": [{"request": {...}, "client": {...}}]}`,
/// `*.graphql` and `*.gql` files hold the text of a single operation.
/// Files that cannot be read or decoded are skipped.
#[derive(Debug, Clone)]
pub struct FileSystemSource {
    root: PathBuf,
}

impl FileSystemSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(source: &CacheWarmupSource) -> Self {
        match source {
            CacheWarmupSource::Filesystem { path } => Self::new(path.as_path()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_file(path: &Path) -> Option<Vec<WarmupItem>> {
        let extension = path.extension().and_then(|extension| extension.to_str())?;
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(err) => {
                warn!("failed to read warmup file '{}': {}", path.display(), err);
                return None;
            }
        };

        match extension {
            "json" => match serde_json::from_str::<Manifest>(&content) {
                Ok(manifest) => Some(
                    manifest
                        .operations
                        .into_iter()
                        .map(|operation| WarmupItem {
                            client: operation.client,
                            body: Bytes::from(operation.request.to_string()),
                        })
                        .collect(),
                ),
                Err(err) => {
                    warn!("failed to parse warmup manifest '{}': {}", path.display(), err);
                    None
                }
            },
            "graphql" | "gql" => Some(vec![WarmupItem {
                client: ClientInfo::default(),
                body: Bytes::from(json!({ "query": content }).to_string()),
            }]),
            _ => {
                debug!("ignoring warmup file '{}'", path.display());
                None
            }
        }
    }
}

#[async_trait]
impl WarmupSource for FileSystemSource {
    async fn load_items(&self) -> Result<Vec<WarmupItem>, WarmupSourceError> {
        let read_dir_error = |source| WarmupSourceError::ReadDir {
            path: self.root.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(read_dir_error)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_dir_error)? {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => paths.push(entry.path()),
                Ok(_) => {}
                Err(err) => warn!("failed to inspect '{}': {}", entry.path().display(), err),
            }
        }
        paths.sort();

        let mut items = Vec::new();
        for path in paths {
            if let Some(file_items) = Self::read_file(&path).await {
                items.extend(file_items);
            }
        }

        debug!(
            "loaded {} warmup items from '{}'",
            items.len(),
            self.root.display()
        );
        Ok(items)
    }
}
