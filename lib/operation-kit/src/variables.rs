use graphql_parser::query::{Type, VariableDefinition};
use serde_json::{Map, Value};

use crate::schema::{display_type, SchemaIndex, TypeEntry, TypeRef};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VariablesValidationError {
    #[error("Variable \"${name}\" of required type \"{type_name}\" was not provided.")]
    Missing { name: String, type_name: String },
    #[error("Variable \"${name}\" got invalid value {value}{at}; {reason}")]
    InvalidValue {
        name: String,
        value: String,
        /// ` at "path"` for values nested in lists or input objects, empty otherwise.
        at: String,
        reason: String,
    },
    #[error("Variable \"${name}\" cannot be of non-input type \"{type_name}\".")]
    NonInputType { name: String, type_name: String },
}

#[derive(Debug)]
enum PathSegment {
    Field(String),
    Index(usize),
}

/// Checks decoded variable values against the variable definitions of an operation.
#[derive(Debug, Default)]
pub struct VariablesValidator {
    path: Vec<PathSegment>,
}

impl VariablesValidator {
    pub fn reset(&mut self) {
        self.path.clear();
    }

    /// Returns the first problem found, in definition order.
    pub fn validate(
        &mut self,
        schema: &SchemaIndex,
        definitions: &[VariableDefinition<'static, String>],
        variables: &Map<String, Value>,
    ) -> Result<(), VariablesValidationError> {
        for definition in definitions {
            self.path.clear();
            match variables.get(&definition.name) {
                None => {
                    if matches!(definition.var_type, Type::NonNullType(_))
                        && definition.default_value.is_none()
                    {
                        return Err(VariablesValidationError::Missing {
                            name: definition.name.clone(),
                            type_name: display_type(&definition.var_type),
                        });
                    }
                }
                Some(value) => {
                    self.validate_value(schema, &definition.name, &definition.var_type, value)
                        .map_err(|(reason, value, at)| match reason {
                            Reason::NonInputType(type_name) => {
                                VariablesValidationError::NonInputType {
                                    name: definition.name.clone(),
                                    type_name,
                                }
                            }
                            Reason::Invalid(reason) => VariablesValidationError::InvalidValue {
                                name: definition.name.clone(),
                                value,
                                at,
                                reason,
                            },
                        })?;
                }
            }
        }

        Ok(())
    }

    fn validate_value(
        &mut self,
        schema: &SchemaIndex,
        variable: &str,
        ty: &TypeRef,
        value: &Value,
    ) -> Result<(), (Reason, String, String)> {
        match ty {
            Type::NonNullType(inner) => {
                if value.is_null() {
                    return Err(self.invalid(
                        variable,
                        value,
                        format!(
                            "Expected non-nullable type \"{}\" not to be null.",
                            display_type(ty)
                        ),
                    ));
                }
                self.validate_value(schema, variable, inner, value)
            }
            Type::ListType(inner) => match value {
                Value::Null => Ok(()),
                Value::Array(items) => {
                    for (index, item) in items.iter().enumerate() {
                        self.path.push(PathSegment::Index(index));
                        self.validate_value(schema, variable, inner, item)?;
                        self.path.pop();
                    }
                    Ok(())
                }
                // A single value is coerced into a list of one.
                other => self.validate_value(schema, variable, inner, other),
            },
            Type::NamedType(type_name) => {
                if value.is_null() {
                    return Ok(());
                }
                match schema.type_entry(type_name) {
                    Some(TypeEntry::Scalar) => match scalar_error(type_name, value) {
                        Some(reason) => Err(self.invalid(variable, value, reason)),
                        None => Ok(()),
                    },
                    Some(TypeEntry::Enum(values)) => match value {
                        Value::String(name) if values.contains(name) => Ok(()),
                        Value::String(name) => Err(self.invalid(
                            variable,
                            value,
                            format!("Value \"{}\" does not exist in \"{}\" enum.", name, type_name),
                        )),
                        _ => Err(self.invalid(
                            variable,
                            value,
                            format!(
                                "Enum \"{}\" cannot represent non-string value: {}.",
                                type_name, value
                            ),
                        )),
                    },
                    Some(TypeEntry::InputObject(fields)) => {
                        let Value::Object(object) = value else {
                            return Err(self.invalid(
                                variable,
                                value,
                                format!("Expected type \"{}\" to be an object.", type_name),
                            ));
                        };
                        if let Some(unknown) = object
                            .keys()
                            .find(|key| !fields.iter().any(|field| &field.name == *key))
                        {
                            return Err(self.invalid(
                                variable,
                                value,
                                format!(
                                    "Field \"{}\" is not defined by type \"{}\".",
                                    unknown, type_name
                                ),
                            ));
                        }
                        for field in fields {
                            match object.get(&field.name) {
                                None => {
                                    if matches!(field.value_type, Type::NonNullType(_))
                                        && !field.has_default
                                    {
                                        return Err(self.invalid(
                                            variable,
                                            value,
                                            format!(
                                                "Field \"{}\" of required type \"{}\" was not provided.",
                                                field.name,
                                                display_type(&field.value_type)
                                            ),
                                        ));
                                    }
                                }
                                Some(field_value) => {
                                    self.path.push(PathSegment::Field(field.name.clone()));
                                    self.validate_value(
                                        schema,
                                        variable,
                                        &field.value_type,
                                        field_value,
                                    )?;
                                    self.path.pop();
                                }
                            }
                        }
                        Ok(())
                    }
                    Some(TypeEntry::Composite(_)) | Some(TypeEntry::Union) | None => Err((
                        Reason::NonInputType(type_name.clone()),
                        String::new(),
                        String::new(),
                    )),
                }
            }
        }
    }

    fn invalid(&self, variable: &str, value: &Value, reason: String) -> (Reason, String, String) {
        let at = if self.path.is_empty() {
            String::new()
        } else {
            let mut path = variable.to_string();
            for segment in &self.path {
                match segment {
                    PathSegment::Field(name) => {
                        path.push('.');
                        path.push_str(name);
                    }
                    PathSegment::Index(index) => path.push_str(&format!("[{}]", index)),
                }
            }
            format!(" at \"{}\"", path)
        };
        (Reason::Invalid(reason), value.to_string(), at)
    }
}

enum Reason {
    Invalid(String),
    NonInputType(String),
}

fn scalar_error(type_name: &str, value: &Value) -> Option<String> {
    match type_name {
        "Int" => match value {
            Value::Number(number) => {
                let fits = match number.as_i64() {
                    Some(int) => i32::try_from(int).is_ok(),
                    None => number.as_f64().is_some_and(|float| {
                        float.fract() == 0.0
                            && float >= i32::MIN as f64
                            && float <= i32::MAX as f64
                    }),
                };
                if fits {
                    None
                } else if number.is_f64() && number.as_f64().is_some_and(|f| f.fract() != 0.0) {
                    Some(format!("Int cannot represent non-integer value: {}", value))
                } else {
                    Some(format!(
                        "Int cannot represent non 32-bit signed integer value: {}",
                        value
                    ))
                }
            }
            _ => Some(format!("Int cannot represent non-integer value: {}", value)),
        },
        "Float" => match value {
            Value::Number(_) => None,
            _ => Some(format!("Float cannot represent non numeric value: {}", value)),
        },
        "String" => match value {
            Value::String(_) => None,
            _ => Some(format!("String cannot represent a non string value: {}", value)),
        },
        "Boolean" => match value {
            Value::Bool(_) => None,
            _ => Some(format!("Boolean cannot represent a non boolean value: {}", value)),
        },
        "ID" => match value {
            Value::String(_) => None,
            Value::Number(number) if number.is_i64() || number.is_u64() => None,
            _ => Some(format!("ID cannot represent value: {}", value)),
        },
        // Custom scalars accept any value.
        _ => None,
    }
}
