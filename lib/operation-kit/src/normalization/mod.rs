use std::collections::HashSet;

use graphql_parser::query as query_ast;
use operation_kit_config::limits::LimitsConfig;
use serde_json::{Map, Value};

pub mod context;
pub mod error;
mod pipeline;
pub mod utils;

use crate::normalization::context::{NormalizationContext, NormalizationOutcome};
use crate::normalization::error::NormalizationError;
use crate::normalization::pipeline::{
    drop_fragment_definitions, drop_unused_operations, extract_variables,
    inline_fragment_spreads, remove_unused_variables,
};
use crate::schema::SchemaIndex;

/// Bounds on the operation once its fragments are expanded. `0` disables a bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionLimits {
    pub max_depth: usize,
    pub max_total_fields: usize,
}

impl From<&LimitsConfig> for SelectionLimits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            max_total_fields: config.max_total_fields,
        }
    }
}

/// Rewrites a parsed document into the canonical form of one of its operations.
///
/// The normalizer keeps its scratch buffers between runs, it lives inside a pooled workspace.
#[derive(Debug, Default)]
pub struct Normalizer {
    extract_variables: bool,
    limits: SelectionLimits,
    fragment_stack: Vec<String>,
    used_variables: HashSet<String>,
}

impl Normalizer {
    pub fn new(extract_variables: bool) -> Self {
        Self {
            extract_variables,
            ..Default::default()
        }
    }

    pub fn with_limits(mut self, limits: SelectionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Normalizes the operation found at `operation_index` of the document's definitions.
    ///
    /// Afterwards the document holds that operation only. `variables` receives the values
    /// of extracted literals and loses the values of variables whose definition was pruned.
    pub fn normalize(
        &mut self,
        schema: &SchemaIndex,
        document: &mut query_ast::Document<'static, String>,
        operation_index: usize,
        variables: &mut Map<String, Value>,
    ) -> Result<NormalizationOutcome, NormalizationError> {
        let mut ctx = NormalizationContext {
            schema,
            document,
            variables,
            fragment_stack: &mut self.fragment_stack,
            used_variables: &mut self.used_variables,
            limits: self.limits,
            outcome: NormalizationOutcome::default(),
        };

        drop_unused_operations(&mut ctx, operation_index)?;
        inline_fragment_spreads(&mut ctx)?;
        drop_fragment_definitions(&mut ctx)?;
        remove_unused_variables(&mut ctx)?;
        if self.extract_variables {
            extract_variables(&mut ctx)?;
        }

        Ok(ctx.outcome)
    }

    pub fn reset(&mut self) {
        self.fragment_stack.clear();
        self.used_variables.clear();
    }
}
