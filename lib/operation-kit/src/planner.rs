use async_trait::async_trait;

use crate::operation::{ClientInfo, ParsedOperation};

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("failed to plan operation: {0}")]
    Failed(String),
    #[error("planning was cancelled")]
    Cancelled,
}

/// Consumer of canonicalized operations, typically the query planner owning the plan cache.
#[async_trait]
pub trait OperationPlanner: Send + Sync {
    async fn plan(
        &self,
        operation: &ParsedOperation,
        client: &ClientInfo,
    ) -> Result<(), PlannerError>;
}

/// Planner that accepts every operation. Warming up with it only fills the canonicalization caches.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPlanner;

#[async_trait]
impl OperationPlanner for NoopPlanner {
    async fn plan(
        &self,
        _operation: &ParsedOperation,
        _client: &ClientInfo,
    ) -> Result<(), PlannerError> {
        Ok(())
    }
}
