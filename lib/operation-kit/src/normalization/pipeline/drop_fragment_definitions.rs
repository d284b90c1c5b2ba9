use graphql_parser::query::Definition;

use crate::normalization::{context::NormalizationContext, error::NormalizationError};

#[inline]
pub fn drop_fragment_definitions(ctx: &mut NormalizationContext) -> Result<(), NormalizationError> {
    ctx.document.definitions.retain(|def| match def {
        Definition::Operation(_) => true,
        Definition::Fragment(_) => false,
    });

    Ok(())
}
