#[derive(Debug, Clone, thiserror::Error)]
pub enum NormalizationError {
    #[error("Expected a transformed operation, but found none.")]
    ExpectedTransformedOperationNotFound,

    #[error("Fragment definition for '{fragment_name}' not found.")]
    FragmentDefinitionNotFound { fragment_name: String },

    #[error("Fragment '{fragment_name}' spreads itself.")]
    FragmentCycle { fragment_name: String },

    #[error("Operation exceeds the maximum selection depth of {limit}.")]
    DepthLimitExceeded { limit: usize },

    #[error("Operation exceeds the maximum of {limit} fields after fragment expansion.")]
    TotalFieldsLimitExceeded { limit: usize },

    #[error("Operation index {index} is out of bounds.")]
    OperationIndexOutOfBounds { index: usize },

    #[error("Failed to print the normalized operation.")]
    PrintFailed,
}
