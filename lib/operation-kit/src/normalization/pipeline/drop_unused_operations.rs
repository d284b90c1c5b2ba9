use graphql_parser::query::Definition;

use crate::normalization::{context::NormalizationContext, error::NormalizationError};

/// Keeps the selected operation and all fragments, drops every other operation.
pub fn drop_unused_operations(
    ctx: &mut NormalizationContext,
    operation_index: usize,
) -> Result<(), NormalizationError> {
    if !matches!(
        ctx.document.definitions.get(operation_index),
        Some(Definition::Operation(_))
    ) {
        return Err(NormalizationError::OperationIndexOutOfBounds {
            index: operation_index,
        });
    }

    let mut position = 0;
    ctx.document.definitions.retain(|def| {
        let keep = match def {
            Definition::Operation(_) => position == operation_index,
            Definition::Fragment(_) => true,
        };
        position += 1;
        keep
    });

    Ok(())
}
