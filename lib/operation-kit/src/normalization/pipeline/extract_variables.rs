use std::collections::HashSet;

use graphql_parser::query::{Selection, SelectionSet, TypeCondition, Value, VariableDefinition};
use graphql_parser::Pos;
use serde_json::{Map, Number, Value as JsonValue};

use crate::normalization::utils::{
    contains_variable, first_operation_mut, selection_set_mut, variable_definitions_mut,
};
use crate::normalization::{context::NormalizationContext, error::NormalizationError};
use crate::schema::{display_type, named_type, SchemaIndex, TypeRef};

/// Replaces inline argument literals with variables, so that operations differing only
/// in literal values share one normalized form.
///
/// Literals are only extracted when the argument type is known from the schema.
/// Equal literals of the same type share a variable. Generated names (`a`, `b`, ..., `aa`)
/// skip the names already defined by the operation.
pub fn extract_variables(ctx: &mut NormalizationContext) -> Result<(), NormalizationError> {
    let root_type = ctx.root_type_name();
    let schema = ctx.schema;
    let extracted = &mut ctx.outcome.extracted_variables;

    let operation = first_operation_mut(ctx.document)
        .ok_or(NormalizationError::ExpectedTransformedOperationNotFound)?;

    let taken: HashSet<String> = match variable_definitions_mut(operation) {
        Some(definitions) => definitions.iter().map(|d| d.name.clone()).collect(),
        // A query shorthand cannot declare variables.
        None => return Ok(()),
    };

    let definitions = {
        let mut extractor = Extractor {
            schema,
            taken,
            next_index: 0,
            definitions: Vec::new(),
            known: Vec::new(),
            extracted,
        };
        extractor.walk(selection_set_mut(operation), root_type);
        extractor.definitions
    };

    if let Some(existing) = variable_definitions_mut(operation) {
        existing.extend(definitions);
    }

    for (name, value) in ctx.outcome.extracted_variables.iter() {
        ctx.variables.insert(name.clone(), value.clone());
    }

    Ok(())
}

struct Extractor<'a> {
    schema: &'a SchemaIndex,
    taken: HashSet<String>,
    next_index: usize,
    definitions: Vec<VariableDefinition<'static, String>>,
    /// (variable name, printed type, value) of every extracted literal.
    known: Vec<(String, String, JsonValue)>,
    extracted: &'a mut Map<String, JsonValue>,
}

impl Extractor<'_> {
    fn walk(&mut self, selection_set: &mut SelectionSet<'static, String>, parent_type: Option<&str>) {
        let schema = self.schema;
        for selection in &mut selection_set.items {
            match selection {
                Selection::Field(field) => {
                    let entry = parent_type.and_then(|parent| schema.field(parent, &field.name));
                    if let Some(entry) = entry {
                        let position = field.position;
                        for (argument_name, value) in field.arguments.iter_mut() {
                            if let Some(argument_type) = entry.arguments.get(argument_name) {
                                self.extract(value, argument_type, position);
                            }
                        }
                    }
                    let field_type = entry.map(|entry| named_type(&entry.field_type));
                    self.walk(&mut field.selection_set, field_type);
                }
                Selection::InlineFragment(fragment) => {
                    let fragment_type = match &fragment.type_condition {
                        Some(TypeCondition::On(name)) => Some(name.as_str()),
                        None => parent_type,
                    };
                    self.walk(&mut fragment.selection_set, fragment_type);
                }
                // Spreads are inlined before extraction runs.
                Selection::FragmentSpread(_) => {}
            }
        }
    }

    fn extract(&mut self, value: &mut Value<'static, String>, argument_type: &TypeRef, position: Pos) {
        if matches!(value, Value::Variable(_) | Value::Null) || contains_variable(value) {
            return;
        }
        let Some(json) = literal_to_json(value) else {
            return;
        };

        let printed_type = display_type(argument_type);
        let existing = self
            .known
            .iter()
            .find(|(_, known_type, known_value)| *known_type == printed_type && *known_value == json)
            .map(|(name, _, _)| name.clone());

        let name = match existing {
            Some(name) => name,
            None => {
                let name = self.next_name();
                self.definitions.push(VariableDefinition {
                    position,
                    name: name.clone(),
                    var_type: argument_type.clone(),
                    default_value: None,
                });
                self.extracted.insert(name.clone(), json.clone());
                self.known.push((name.clone(), printed_type, json));
                name
            }
        };

        *value = Value::Variable(name);
    }

    fn next_name(&mut self) -> String {
        loop {
            let candidate = generated_name(self.next_index);
            self.next_index += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// `0 -> a`, `25 -> z`, `26 -> aa`, `27 -> ab`, ...
fn generated_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// JSON form of a constant GraphQL value. `None` for values JSON cannot hold.
pub fn literal_to_json(value: &Value<'static, String>) -> Option<JsonValue> {
    Some(match value {
        Value::Variable(_) => return None,
        Value::Int(number) => JsonValue::Number(number.as_i64()?.into()),
        Value::Float(float) => JsonValue::Number(Number::from_f64(*float)?),
        Value::String(string) => JsonValue::String(string.clone()),
        Value::Boolean(boolean) => JsonValue::Bool(*boolean),
        Value::Null => JsonValue::Null,
        Value::Enum(name) => JsonValue::String(name.clone()),
        Value::List(items) => JsonValue::Array(
            items
                .iter()
                .map(literal_to_json)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Object(fields) => JsonValue::Object(
            fields
                .iter()
                .map(|(key, item)| Some((key.clone(), literal_to_json(item)?)))
                .collect::<Option<Map<_, _>>>()?,
        ),
    })
}
