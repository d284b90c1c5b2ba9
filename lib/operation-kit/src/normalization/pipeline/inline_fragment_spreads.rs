use std::collections::HashMap;

use graphql_parser::query::{
    Definition, FragmentDefinition, InlineFragment, Selection, SelectionSet, TypeCondition,
};

use crate::normalization::utils::{first_operation_mut, selection_set_mut};
use crate::normalization::{context::NormalizationContext, error::NormalizationError};
use crate::normalization::SelectionLimits;
use crate::schema::{named_type, SchemaIndex};

/// Counts fields as fragments are expanded, so a document that spreads fragments
/// many times over is rejected before its expanded form is built.
struct SelectionBudget {
    limits: SelectionLimits,
    fields: usize,
}

impl SelectionBudget {
    fn count_field(&mut self, depth: usize) -> Result<(), NormalizationError> {
        let max_depth = self.limits.max_depth;
        if max_depth > 0 && depth > max_depth {
            return Err(NormalizationError::DepthLimitExceeded { limit: max_depth });
        }

        self.fields += 1;
        let max_fields = self.limits.max_total_fields;
        if max_fields > 0 && self.fields > max_fields {
            return Err(NormalizationError::TotalFieldsLimitExceeded { limit: max_fields });
        }

        Ok(())
    }
}

#[inline]
pub fn inline_fragment_spreads(ctx: &mut NormalizationContext) -> Result<(), NormalizationError> {
    let mut fragment_map: HashMap<String, FragmentDefinition<'static, String>> = HashMap::new();
    for definition in &ctx.document.definitions {
        if let Definition::Fragment(frag_def) = definition {
            fragment_map.insert(frag_def.name.clone(), frag_def.clone());
        }
    }

    let root_type = ctx.root_type_name();
    let schema = ctx.schema;
    let stack = &mut *ctx.fragment_stack;
    stack.clear();
    let mut budget = SelectionBudget {
        limits: ctx.limits,
        fields: 0,
    };

    let operation = first_operation_mut(ctx.document)
        .ok_or(NormalizationError::ExpectedTransformedOperationNotFound)?;

    handle_selection_set(
        selection_set_mut(operation),
        &fragment_map,
        schema,
        root_type,
        stack,
        &mut budget,
        1,
    )
}

fn type_condition_name<'a>(type_condition: &'a TypeCondition<'static, String>) -> &'a str {
    match type_condition {
        TypeCondition::On(name) => name,
    }
}

#[inline]
fn handle_selection_set(
    selection_set: &mut SelectionSet<'static, String>,
    fragment_map: &HashMap<String, FragmentDefinition<'static, String>>,
    schema: &SchemaIndex,
    parent_type: Option<&str>,
    stack: &mut Vec<String>,
    budget: &mut SelectionBudget,
    depth: usize,
) -> Result<(), NormalizationError> {
    let old_items = std::mem::take(&mut selection_set.items);
    let mut new_items = Vec::with_capacity(old_items.len());

    for selection in old_items {
        match selection {
            Selection::Field(mut field) => {
                budget.count_field(depth)?;
                let field_type = parent_type
                    .and_then(|parent| schema.field(parent, &field.name))
                    .map(|entry| named_type(&entry.field_type));
                handle_selection_set(
                    &mut field.selection_set,
                    fragment_map,
                    schema,
                    field_type,
                    stack,
                    budget,
                    depth + 1,
                )?;
                new_items.push(Selection::Field(field));
            }
            Selection::FragmentSpread(spread) => {
                let fragment_def = fragment_map.get(&spread.fragment_name).ok_or_else(|| {
                    NormalizationError::FragmentDefinitionNotFound {
                        fragment_name: spread.fragment_name.clone(),
                    }
                })?;

                if stack.contains(&spread.fragment_name) {
                    return Err(NormalizationError::FragmentCycle {
                        fragment_name: spread.fragment_name,
                    });
                }

                let fragment_type = type_condition_name(&fragment_def.type_condition);
                let mut fragment_selection_set = fragment_def.selection_set.clone();

                stack.push(spread.fragment_name.clone());
                handle_selection_set(
                    &mut fragment_selection_set,
                    fragment_map,
                    schema,
                    Some(fragment_type),
                    stack,
                    budget,
                    depth,
                )?;
                stack.pop();

                if spread.directives.is_empty() && parent_type == Some(fragment_type) {
                    // Same type and no conditions, the selections can be merged into the parent.
                    new_items.extend(fragment_selection_set.items);
                } else {
                    new_items.push(Selection::InlineFragment(InlineFragment {
                        position: spread.position,
                        type_condition: Some(fragment_def.type_condition.clone()),
                        directives: spread.directives,
                        selection_set: fragment_selection_set,
                    }));
                }
            }
            Selection::InlineFragment(mut inline_fragment) => {
                let fragment_type = inline_fragment
                    .type_condition
                    .as_ref()
                    .map(type_condition_name)
                    .or(parent_type);
                handle_selection_set(
                    &mut inline_fragment.selection_set,
                    fragment_map,
                    schema,
                    fragment_type,
                    stack,
                    budget,
                    depth,
                )?;
                new_items.push(Selection::InlineFragment(inline_fragment));
            }
        }
    }
    selection_set.items = new_items;

    Ok(())
}
