use std::sync::Arc;

use graphql_parser::query::Definition;
use serde_json::{Map, Value};
use tracing::trace;

use crate::cache_state::CachedOperation;
use crate::error::OperationError;
use crate::normalization::error::NormalizationError;
use crate::normalization::utils::{first_operation_mut, set_operation_name};
use crate::pipeline::parse::SelectedOperation;
use crate::printer::{hash_document, print_document};
use crate::schema::SchemaIndex;
use crate::workspace::Workspace;

/// Name given to every operation while its identity is hashed.
pub const OPERATION_NAME_PLACEHOLDER: &str = "O";

/// Normalizes the selected operation of the workspace document, then hashes and prints it.
///
/// The hash is computed with the placeholder name, so it does not depend on the name the
/// client picked. The printed representation carries the real name.
pub fn normalize_selected_operation(
    schema: &SchemaIndex,
    workspace: &mut Workspace,
    selected: &SelectedOperation,
    variables: &mut Map<String, Value>,
) -> Result<CachedOperation, OperationError> {
    let Workspace {
        document,
        hasher,
        normalizer,
        output,
        ..
    } = workspace;
    let document = document
        .as_mut()
        .ok_or_else(|| OperationError::Internal("workspace holds no document".to_string()))?;

    match document.definitions.get_mut(selected.index) {
        Some(Definition::Operation(operation)) => {
            set_operation_name(operation, Some(OPERATION_NAME_PLACEHOLDER.to_string()))
        }
        _ => {
            return Err(NormalizationError::OperationIndexOutOfBounds {
                index: selected.index,
            }
            .into())
        }
    }

    let outcome = normalizer.normalize(schema, document, selected.index, variables)?;
    let id = hash_document(hasher, document)?;

    let operation = first_operation_mut(document)
        .ok_or(NormalizationError::ExpectedTransformedOperationNotFound)?;
    set_operation_name(operation, selected.name.clone());
    print_document(output, document)?;

    trace!(
        operation_id = id,
        "normalized operation (name={:?}): {}",
        selected.name,
        output
    );

    Ok(CachedOperation {
        id,
        kind: selected.kind,
        name: selected.name.clone(),
        normalized_representation: Arc::from(output.as_str()),
        outcome: Arc::new(outcome),
    })
}

/// Applies to the client variables what normalization did to them when the cached result was produced.
pub fn replay_outcome(cached: &CachedOperation, variables: &mut Map<String, Value>) {
    for name in &cached.outcome.pruned_variables {
        variables.remove(name);
    }
    for (name, value) in &cached.outcome.extracted_variables {
        variables.insert(name.clone(), value.clone());
    }
}
