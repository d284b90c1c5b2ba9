use graphql_parser::query::{Selection, SelectionSet};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::OperationError;
use crate::normalization::utils::{first_operation, selection_set, variable_definitions};
use crate::operation::OperationKind;
use crate::pipeline::ProcessorOptions;
use crate::schema::SchemaIndex;
use crate::workspace::Workspace;

/// Checks the normalized operation held by the workspace against the decoded variables.
pub fn validate_operation(
    schema: &SchemaIndex,
    options: &ProcessorOptions,
    workspace: &mut Workspace,
    variables: &Map<String, Value>,
) -> Result<(), OperationError> {
    let Workspace {
        document,
        validator,
        ..
    } = workspace;
    let operation = document
        .as_ref()
        .and_then(first_operation)
        .ok_or_else(|| OperationError::Internal("workspace holds no operation".to_string()))?;

    if !options.introspection_enabled
        && OperationKind::of(operation) == OperationKind::Query
        && selects_introspection(selection_set(operation))
    {
        return Err(OperationError::IntrospectionDisabled);
    }

    validator
        .validate(schema, variable_definitions(operation), variables)
        .map_err(|source| {
            debug!("variables validation failed: {}", source);
            OperationError::InvalidVariables {
                source,
                bad_request: options.replace_validation_error_status,
            }
        })
}

fn selects_introspection(selection_set: &SelectionSet<'static, String>) -> bool {
    selection_set.items.iter().any(|selection| match selection {
        Selection::Field(field) => field.name == "__schema" || field.name == "__type",
        Selection::InlineFragment(fragment) => selects_introspection(&fragment.selection_set),
        Selection::FragmentSpread(_) => false,
    })
}
