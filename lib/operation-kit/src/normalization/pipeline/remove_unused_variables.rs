use std::collections::HashSet;

use graphql_parser::query::{Directive, Selection, SelectionSet};

use crate::normalization::utils::{
    first_operation_mut, operation_directives, selection_set, variable_definitions_mut,
    visit_variables,
};
use crate::normalization::{context::NormalizationContext, error::NormalizationError};

/// Removes variable definitions nothing refers to, together with their values.
pub fn remove_unused_variables(ctx: &mut NormalizationContext) -> Result<(), NormalizationError> {
    let used = &mut *ctx.used_variables;
    used.clear();

    let operation = first_operation_mut(ctx.document)
        .ok_or(NormalizationError::ExpectedTransformedOperationNotFound)?;

    collect_from_directives(operation_directives(operation), used);
    collect_from_selection_set(selection_set(operation), used);

    let Some(definitions) = variable_definitions_mut(operation) else {
        return Ok(());
    };

    let pruned = &mut ctx.outcome.pruned_variables;
    definitions.retain(|definition| {
        if used.contains(&definition.name) {
            true
        } else {
            pruned.push(definition.name.clone());
            false
        }
    });

    for name in pruned.iter() {
        ctx.variables.remove(name);
    }

    Ok(())
}

fn collect_from_directives(directives: &[Directive<'static, String>], used: &mut HashSet<String>) {
    for directive in directives {
        for (_, value) in &directive.arguments {
            visit_variables(value, &mut |name| {
                used.insert(name.to_string());
            });
        }
    }
}

fn collect_from_selection_set(
    selection_set: &SelectionSet<'static, String>,
    used: &mut HashSet<String>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                for (_, value) in &field.arguments {
                    visit_variables(value, &mut |name| {
                        used.insert(name.to_string());
                    });
                }
                collect_from_directives(&field.directives, used);
                collect_from_selection_set(&field.selection_set, used);
            }
            Selection::FragmentSpread(spread) => {
                collect_from_directives(&spread.directives, used);
            }
            Selection::InlineFragment(fragment) => {
                collect_from_directives(&fragment.directives, used);
                collect_from_selection_set(&fragment.selection_set, used);
            }
        }
    }
}
