use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::error::{json_kind, OperationError};

const PERSISTED_QUERY_EXTENSION: &str = "persistedQuery";
const SUPPORTED_PERSISTED_QUERY_VERSION: i64 = 1;

/// Reference to a previously registered operation, carried in `extensions.persistedQuery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedQuery {
    pub version: i64,
    /// Lowercase or uppercase hex encoded sha256 of the operation body, 64 characters long.
    pub sha256_hash: String,
}

/// A decoded GraphQL-over-HTTP request body.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQLRequest {
    pub query: Option<String>,
    pub operation_name: Option<String>,
    /// Always an object, `null` and absent variables decode to an empty one.
    pub variables: Map<String, Value>,
    /// The extensions without `persistedQuery`.
    pub extensions: Option<Map<String, Value>>,
    pub persisted_query: Option<PersistedQuery>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    operation_name: Option<String>,
    #[serde(default)]
    variables: Option<Value>,
    #[serde(default)]
    extensions: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPersistedQuery {
    #[serde(default)]
    version: Option<i64>,
    #[serde(default)]
    sha256_hash: Option<String>,
}

impl GraphQLRequest {
    /// Decodes a JSON request body. `max_size` of `0` disables the size check.
    pub fn decode(body: &[u8], max_size: usize) -> Result<Self, OperationError> {
        if max_size > 0 && body.len() > max_size {
            return Err(OperationError::EntityTooLarge {
                size: body.len(),
                max: max_size,
            });
        }

        let raw: RawRequest = serde_json::from_slice(body).map_err(|err| {
            trace!("failed to deserialize request body: {}", err);
            OperationError::MalformedBody(err)
        })?;

        let variables = match raw.variables {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => return Err(OperationError::InvalidVariablesType(json_kind(&other))),
        };

        let (extensions, persisted_query) = match raw.extensions {
            None => (None, None),
            Some(Value::Object(mut map)) => {
                let persisted_query = match map.remove(PERSISTED_QUERY_EXTENSION) {
                    None | Some(Value::Null) => None,
                    Some(value) => decode_persisted_query(value)?,
                };
                (Some(map), persisted_query)
            }
            Some(other) => return Err(OperationError::InvalidExtensionsType(json_kind(&other))),
        };

        Ok(GraphQLRequest {
            query: raw.query.filter(|query| !query.is_empty()),
            operation_name: raw.operation_name.filter(|name| !name.is_empty()),
            variables,
            extensions,
            persisted_query,
        })
    }

    /// Whether the operation has to be resolved through the persisted operation store.
    pub fn is_persisted_only(&self) -> bool {
        self.query.is_none() && self.persisted_query.is_some()
    }
}

fn decode_persisted_query(value: Value) -> Result<Option<PersistedQuery>, OperationError> {
    let raw: RawPersistedQuery =
        serde_json::from_value(value).map_err(OperationError::InvalidPersistedQuery)?;

    if raw.version != Some(SUPPORTED_PERSISTED_QUERY_VERSION) {
        warn!(
            "ignoring persistedQuery extension with unsupported version {:?}",
            raw.version
        );
        return Ok(None);
    }

    match raw.sha256_hash {
        Some(hash) if is_sha256_hex(&hash) => Ok(Some(PersistedQuery {
            version: SUPPORTED_PERSISTED_QUERY_VERSION,
            sha256_hash: hash,
        })),
        _ => Err(OperationError::InvalidPersistedQueryHash),
    }
}

fn is_sha256_hex(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}
