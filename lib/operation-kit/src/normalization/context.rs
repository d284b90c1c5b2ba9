use std::collections::HashSet;

use graphql_parser::query as query_ast;
use serde_json::{Map, Value};

use crate::normalization::utils::first_operation;
use crate::normalization::SelectionLimits;
use crate::operation::OperationKind;
use crate::schema::SchemaIndex;

/// What normalization changed in the variables, kept so cached results can replay it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationOutcome {
    /// Values of the variables created from inline literals.
    pub extracted_variables: Map<String, Value>,
    /// Variables whose definition was removed because nothing referenced them.
    pub pruned_variables: Vec<String>,
}

pub struct NormalizationContext<'a> {
    pub schema: &'a SchemaIndex,
    pub document: &'a mut query_ast::Document<'static, String>,
    pub variables: &'a mut Map<String, Value>,
    pub fragment_stack: &'a mut Vec<String>,
    pub used_variables: &'a mut HashSet<String>,
    pub limits: SelectionLimits,
    pub outcome: NormalizationOutcome,
}

impl<'a> NormalizationContext<'a> {
    pub fn root_type_name(&self) -> Option<&'a str> {
        let kind = first_operation(self.document).map(OperationKind::of)?;
        self.schema.root_type(kind)
    }
}
