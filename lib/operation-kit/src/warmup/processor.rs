use std::sync::Arc;

use async_trait::async_trait;

use crate::error::OperationError;
use crate::operation::{OperationKind, ParsedOperation};
use crate::pipeline::OperationProcessor;
use crate::planner::{OperationPlanner, PlannerError};
use crate::warmup::WarmupItem;

#[derive(Debug, thiserror::Error)]
pub enum WarmupItemError {
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Planning(#[from] PlannerError),
}

/// What a warmed up item turned into.
#[derive(Debug, Clone, PartialEq)]
pub struct WarmedOperation {
    pub id: u64,
    pub name: Option<String>,
    pub kind: OperationKind,
    pub sha256_hash: String,
}

impl From<&ParsedOperation> for WarmedOperation {
    fn from(operation: &ParsedOperation) -> Self {
        Self {
            id: operation.id,
            name: operation.name.clone(),
            kind: operation.kind,
            sha256_hash: operation.sha256_hash.clone(),
        }
    }
}

/// Handles one warmup item.
#[async_trait]
pub trait WarmupProcessor: Send + Sync {
    async fn process(&self, item: &WarmupItem) -> Result<WarmedOperation, WarmupItemError>;
}

/// Canonicalizes the item through the shared processor, then plans it.
pub struct PlanningWarmupProcessor {
    processor: Arc<OperationProcessor>,
    planner: Arc<dyn OperationPlanner>,
}

impl PlanningWarmupProcessor {
    pub fn new(processor: Arc<OperationProcessor>, planner: Arc<dyn OperationPlanner>) -> Self {
        Self { processor, planner }
    }
}

#[async_trait]
impl WarmupProcessor for PlanningWarmupProcessor {
    async fn process(&self, item: &WarmupItem) -> Result<WarmedOperation, WarmupItemError> {
        let operation = self
            .processor
            .canonicalize(&item.body, &item.client)
            .await?;
        self.planner.plan(&operation, &item.client).await?;

        Ok(WarmedOperation::from(&operation))
    }
}
