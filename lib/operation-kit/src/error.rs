use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::normalization::error::NormalizationError;
use crate::persisted_operations::PersistedOperationError;
use crate::variables::VariablesValidationError;

/// Coarse classification of an [`OperationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The request could not be decoded as a GraphQL request.
    Structural,
    /// The request is valid JSON, but the document is not valid GraphQL.
    Grammar,
    /// The document is valid, but the operation cannot be selected or accepted.
    Semantic,
    /// A collaborator (persisted operation store) failed or had no answer.
    Infrastructure,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("request body of {size} bytes exceeds the maximum of {max} bytes")]
    EntityTooLarge { size: usize, max: usize },
    #[error("failed to parse request body: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("variables value must not be {}", with_article(.0))]
    InvalidVariablesType(&'static str),
    #[error("invalid extensions type: {0}, must be object or null")]
    InvalidExtensionsType(&'static str),
    #[error("persistedQuery does not have a valid sha256 hash")]
    InvalidPersistedQueryHash,
    #[error("invalid persistedQuery extension: {0}")]
    InvalidPersistedQuery(#[source] serde_json::Error),
    #[error("empty request body")]
    EmptyRequest,
    #[error("operation name of length {length} exceeds max length of {max}")]
    OperationNameTooLong { length: usize, max: usize },

    #[error("{0}")]
    InvalidSyntax(#[source] graphql_parser::query::ParseError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("operation name is required when multiple operations are defined")]
    OperationNameRequired,
    #[error("operation with name '{0}' not found")]
    OperationNotFound(String),
    #[error("operation document contains no operations")]
    NoOperations,
    #[error("GraphQL introspection is disabled, but the query contained __schema or __type")]
    IntrospectionDisabled,
    #[error("{source}")]
    InvalidVariables {
        #[source]
        source: VariablesValidationError,
        /// Report with `400` instead of `200`.
        bad_request: bool,
    },

    #[error("could not resolve persisted query, feature is not configured")]
    PersistedOperationsDisabled,
    #[error(transparent)]
    PersistedOperation(#[from] PersistedOperationError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl OperationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EntityTooLarge { .. }
            | Self::MalformedBody(_)
            | Self::InvalidVariablesType(_)
            | Self::InvalidExtensionsType(_)
            | Self::InvalidPersistedQueryHash
            | Self::InvalidPersistedQuery(_)
            | Self::EmptyRequest
            | Self::OperationNameTooLong { .. } => ErrorKind::Structural,
            Self::InvalidSyntax(_) | Self::Normalization(_) => ErrorKind::Grammar,
            Self::OperationNameRequired
            | Self::OperationNotFound(_)
            | Self::NoOperations
            | Self::IntrospectionDisabled
            | Self::InvalidVariables { .. } => ErrorKind::Semantic,
            Self::PersistedOperationsDisabled | Self::PersistedOperation(_) => {
                ErrorKind::Infrastructure
            }
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn graphql_error_code(&self) -> &'static str {
        match self {
            Self::EntityTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::InvalidSyntax(_) => "GRAPHQL_PARSE_FAILED",
            Self::Normalization(_) => "GRAPHQL_VALIDATION_FAILED",
            Self::OperationNameRequired | Self::OperationNotFound(_) | Self::NoOperations => {
                "OPERATION_RESOLUTION_FAILURE"
            }
            Self::IntrospectionDisabled => "INTROSPECTION_DISABLED",
            Self::InvalidVariables { .. } => "BAD_USER_INPUT",
            Self::PersistedOperationsDisabled => "PERSISTED_QUERY_NOT_SUPPORTED",
            Self::PersistedOperation(PersistedOperationError::NotFound(_)) => {
                "PERSISTED_QUERY_NOT_FOUND"
            }
            Self::PersistedOperation(_) | Self::Internal(_) => "INTERNAL_SERVER_ERROR",
            _ => "BAD_REQUEST",
        }
    }

    pub fn graphql_error_message(&self) -> String {
        match self {
            Self::PersistedOperation(PersistedOperationError::NotFound(_)) => {
                "PersistedQueryNotFound".to_string()
            }
            Self::PersistedOperation(_) | Self::Internal(_) => "Unexpected error".to_string(),
            _ => self.to_string(),
        }
    }

    /// The HTTP status the transport should answer with.
    ///
    /// `prefer_ok` is set when the client did not ask for `application/graphql-response+json`,
    /// in which case errors found in the document are reported in the body with `200`.
    pub fn status_code(&self, prefer_ok: bool) -> StatusCode {
        match (self, prefer_ok) {
            (Self::EntityTooLarge { .. }, _) => StatusCode::PAYLOAD_TOO_LARGE,
            (Self::MalformedBody(_), _) => StatusCode::BAD_REQUEST,
            (Self::InvalidVariablesType(_), _) => StatusCode::BAD_REQUEST,
            (Self::InvalidExtensionsType(_), _) => StatusCode::BAD_REQUEST,
            (Self::InvalidPersistedQueryHash, _) => StatusCode::BAD_REQUEST,
            (Self::InvalidPersistedQuery(_), _) => StatusCode::BAD_REQUEST,
            (Self::EmptyRequest, _) => StatusCode::BAD_REQUEST,
            (Self::OperationNameTooLong { .. }, _) => StatusCode::BAD_REQUEST,
            (Self::InvalidSyntax(_), false) => StatusCode::BAD_REQUEST,
            (Self::InvalidSyntax(_), true) => StatusCode::OK,
            (Self::Normalization(_), false) => StatusCode::BAD_REQUEST,
            (Self::Normalization(_), true) => StatusCode::OK,
            (Self::OperationNameRequired, _) => StatusCode::OK,
            (Self::OperationNotFound(_), _) => StatusCode::OK,
            (Self::NoOperations, _) => StatusCode::OK,
            (Self::IntrospectionDisabled, _) => StatusCode::OK,
            (Self::InvalidVariables { bad_request, .. }, _) => {
                if *bad_request {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::OK
                }
            }
            (Self::PersistedOperationsDisabled, _) => StatusCode::OK,
            (Self::PersistedOperation(PersistedOperationError::NotFound(_)), _) => StatusCode::OK,
            (Self::PersistedOperation(_), _) => StatusCode::INTERNAL_SERVER_ERROR,
            (Self::Internal(_), _) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_graphql_errors(&self) -> Vec<GraphQLError> {
        vec![GraphQLError {
            message: self.graphql_error_message(),
            extensions: Some(GraphQLErrorExtensions {
                code: self.graphql_error_code(),
            }),
        }]
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GraphQLError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<GraphQLErrorExtensions>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GraphQLErrorExtensions {
    pub code: &'static str,
}

/// JSON kind name of a value, as used in error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn with_article(kind: &str) -> String {
    match kind.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => format!("an {}", kind),
        _ => format!("a {}", kind),
    }
}
