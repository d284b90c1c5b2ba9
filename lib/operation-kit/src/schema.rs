use std::collections::{HashMap, HashSet};

use graphql_parser::query::Type;
use graphql_parser::schema::{self as schema_ast, Definition, TypeDefinition, TypeExtension};

use crate::operation::OperationKind;

pub type TypeRef = Type<'static, String>;

const BUILTIN_SCALARS: &[&str] = &["Int", "Float", "String", "Boolean", "ID"];

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[from] schema_ast::ParseError),
    #[error("schema does not define the query root type '{0}'")]
    MissingQueryType(String),
}

#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub field_type: TypeRef,
    pub arguments: HashMap<String, TypeRef>,
}

#[derive(Debug, Clone)]
pub struct InputValueEntry {
    pub name: String,
    pub value_type: TypeRef,
    pub has_default: bool,
}

#[derive(Debug, Clone)]
pub enum TypeEntry {
    Scalar,
    /// Object and interface types.
    Composite(HashMap<String, FieldEntry>),
    Union,
    Enum(HashSet<String>),
    InputObject(Vec<InputValueEntry>),
}

/// Lookup tables over a schema document, used to type literals during variable
/// extraction and to validate variable values.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    query_type: String,
    mutation_type: Option<String>,
    subscription_type: Option<String>,
    types: HashMap<String, TypeEntry>,
}

impl SchemaIndex {
    pub fn parse(sdl: &str) -> Result<Self, SchemaError> {
        let document = graphql_parser::parse_schema::<String>(sdl)?.into_static();
        Self::from_document(&document)
    }

    pub fn from_document(
        document: &schema_ast::Document<'static, String>,
    ) -> Result<Self, SchemaError> {
        let mut types: HashMap<String, TypeEntry> = BUILTIN_SCALARS
            .iter()
            .map(|name| (name.to_string(), TypeEntry::Scalar))
            .collect();
        let mut roots: (Option<String>, Option<String>, Option<String>) = (None, None, None);

        for definition in &document.definitions {
            match definition {
                Definition::SchemaDefinition(schema) => {
                    roots = (
                        schema.query.clone(),
                        schema.mutation.clone(),
                        schema.subscription.clone(),
                    );
                }
                Definition::TypeDefinition(type_def) => {
                    let (name, entry) = type_entry_from_definition(type_def);
                    types.insert(name, entry);
                }
                Definition::TypeExtension(_) | Definition::DirectiveDefinition(_) => {}
            }
        }

        // Extensions are applied after all definitions, regardless of their position.
        for definition in &document.definitions {
            if let Definition::TypeExtension(extension) = definition {
                apply_extension(&mut types, extension);
            }
        }

        let query_type = roots.0.unwrap_or_else(|| "Query".to_string());
        if !types.contains_key(&query_type) {
            return Err(SchemaError::MissingQueryType(query_type));
        }
        let mutation_type = roots
            .1
            .or_else(|| Some("Mutation".to_string()))
            .filter(|name| types.contains_key(name));
        let subscription_type = roots
            .2
            .or_else(|| Some("Subscription".to_string()))
            .filter(|name| types.contains_key(name));

        Ok(SchemaIndex {
            query_type,
            mutation_type,
            subscription_type,
            types,
        })
    }

    pub fn root_type(&self, kind: OperationKind) -> Option<&str> {
        match kind {
            OperationKind::Query => Some(&self.query_type),
            OperationKind::Mutation => self.mutation_type.as_deref(),
            OperationKind::Subscription => self.subscription_type.as_deref(),
        }
    }

    pub fn type_entry(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldEntry> {
        match self.types.get(type_name) {
            Some(TypeEntry::Composite(fields)) => fields.get(field_name),
            _ => None,
        }
    }
}

/// The innermost named type of a possibly wrapped type.
pub fn named_type(ty: &TypeRef) -> &str {
    match ty {
        Type::NamedType(name) => name,
        Type::ListType(inner) | Type::NonNullType(inner) => named_type(inner),
    }
}

/// GraphQL notation of a type reference, e.g. `[String!]!`.
pub fn display_type(ty: &TypeRef) -> String {
    match ty {
        Type::NamedType(name) => name.clone(),
        Type::ListType(inner) => format!("[{}]", display_type(inner)),
        Type::NonNullType(inner) => format!("{}!", display_type(inner)),
    }
}

fn fields_map(fields: &[schema_ast::Field<'static, String>]) -> HashMap<String, FieldEntry> {
    fields
        .iter()
        .map(|field| {
            (
                field.name.clone(),
                FieldEntry {
                    field_type: field.field_type.clone(),
                    arguments: field
                        .arguments
                        .iter()
                        .map(|arg| (arg.name.clone(), arg.value_type.clone()))
                        .collect(),
                },
            )
        })
        .collect()
}

fn input_values(values: &[schema_ast::InputValue<'static, String>]) -> Vec<InputValueEntry> {
    values
        .iter()
        .map(|value| InputValueEntry {
            name: value.name.clone(),
            value_type: value.value_type.clone(),
            has_default: value.default_value.is_some(),
        })
        .collect()
}

fn type_entry_from_definition(definition: &TypeDefinition<'static, String>) -> (String, TypeEntry) {
    match definition {
        TypeDefinition::Scalar(scalar) => (scalar.name.clone(), TypeEntry::Scalar),
        TypeDefinition::Object(object) => (
            object.name.clone(),
            TypeEntry::Composite(fields_map(&object.fields)),
        ),
        TypeDefinition::Interface(interface) => (
            interface.name.clone(),
            TypeEntry::Composite(fields_map(&interface.fields)),
        ),
        TypeDefinition::Union(union) => (union.name.clone(), TypeEntry::Union),
        TypeDefinition::Enum(enum_type) => (
            enum_type.name.clone(),
            TypeEntry::Enum(enum_type.values.iter().map(|v| v.name.clone()).collect()),
        ),
        TypeDefinition::InputObject(input) => (
            input.name.clone(),
            TypeEntry::InputObject(input_values(&input.fields)),
        ),
    }
}

fn apply_extension(types: &mut HashMap<String, TypeEntry>, extension: &TypeExtension<'static, String>) {
    match extension {
        TypeExtension::Object(ext) => extend_fields(types, &ext.name, &ext.fields),
        TypeExtension::Interface(ext) => extend_fields(types, &ext.name, &ext.fields),
        TypeExtension::Enum(ext) => {
            let entry = types
                .entry(ext.name.clone())
                .or_insert_with(|| TypeEntry::Enum(HashSet::new()));
            if let TypeEntry::Enum(values) = entry {
                values.extend(ext.values.iter().map(|v| v.name.clone()));
            }
        }
        TypeExtension::InputObject(ext) => {
            let entry = types
                .entry(ext.name.clone())
                .or_insert_with(|| TypeEntry::InputObject(Vec::new()));
            if let TypeEntry::InputObject(fields) = entry {
                fields.extend(input_values(&ext.fields));
            }
        }
        TypeExtension::Scalar(_) | TypeExtension::Union(_) => {}
    }
}

fn extend_fields(
    types: &mut HashMap<String, TypeEntry>,
    name: &str,
    fields: &[schema_ast::Field<'static, String>],
) {
    let entry = types
        .entry(name.to_string())
        .or_insert_with(|| TypeEntry::Composite(HashMap::new()));
    if let TypeEntry::Composite(existing) = entry {
        existing.extend(fields_map(fields));
    }
}
