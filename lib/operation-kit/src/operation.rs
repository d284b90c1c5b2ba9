use bytes::Bytes;
use graphql_parser::query::OperationDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

impl OperationKind {
    pub fn of(definition: &OperationDefinition<'_, String>) -> Self {
        match definition {
            OperationDefinition::SelectionSet(_) | OperationDefinition::Query(_) => {
                OperationKind::Query
            }
            OperationDefinition::Mutation(_) => OperationKind::Mutation,
            OperationDefinition::Subscription(_) => OperationKind::Subscription,
        }
    }
}

/// Identity of the client sending an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl ClientInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A file sent alongside the operation (GraphQL multipart request).
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    /// Object path of the variable the file is bound to, e.g. `variables.files.0`.
    pub variable_path: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

/// The canonical form of a client operation.
#[derive(Debug, Clone)]
pub struct ParsedOperation {
    /// Hash of the normalized operation, independent of the operation name.
    pub id: u64,
    pub kind: OperationKind,
    /// Name of the selected definition, or the name supplied by the client for an unnamed one.
    pub name: Option<String>,
    /// Printed normalized operation, with its real name.
    pub normalized_representation: String,
    /// Client variables merged with the values extracted during normalization.
    pub variables: Map<String, Value>,
    pub extensions: Option<Map<String, Value>>,
    pub files: Vec<FileUpload>,
    /// Hex encoded sha256 of the operation text sent by the client,
    /// or the persisted query hash.
    pub sha256_hash: String,
    pub persisted: bool,
    pub persisted_operation_cache_hit: bool,
    pub normalization_cache_hit: bool,
}

impl ParsedOperation {
    pub fn variables_json(&self) -> Value {
        Value::Object(self.variables.clone())
    }
}
