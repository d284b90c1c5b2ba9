use graphql_parser::query::{Definition, Document, ParseError};

use crate::error::OperationError;
use crate::normalization::utils::operation_name;
use crate::operation::OperationKind;

#[inline]
pub fn parse_document(query: &str) -> Result<Document<'static, String>, ParseError> {
    graphql_parser::parse_query::<String>(query).map(|document| document.into_static())
}

/// The operation of a document that a request refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedOperation {
    /// Position among the document's definitions (fragments included).
    pub index: usize,
    pub kind: OperationKind,
    /// The name written in the document, if any.
    pub name: Option<String>,
}

/// Picks the operation to execute.
///
/// A document with a single operation always resolves to it. With several operations,
/// `requested_name` is required and must match one of them.
///
/// Every operation name of the document is held to `max_name_length`, not only the
/// selected one. `0` disables the check.
pub fn select_operation(
    document: &Document<'static, String>,
    requested_name: Option<&str>,
    max_name_length: usize,
) -> Result<SelectedOperation, OperationError> {
    if max_name_length > 0 {
        let too_long = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                Definition::Operation(operation) => operation_name(operation),
                Definition::Fragment(_) => None,
            })
            .find(|name| name.len() > max_name_length);
        if let Some(name) = too_long {
            return Err(OperationError::OperationNameTooLong {
                length: name.len(),
                max: max_name_length,
            });
        }
    }

    let mut operations = document
        .definitions
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| match definition {
            Definition::Operation(operation) => Some((index, operation)),
            Definition::Fragment(_) => None,
        })
        .peekable();

    let Some((first_index, first)) = operations.next() else {
        return Err(OperationError::NoOperations);
    };

    let selected = if operations.peek().is_none() {
        (first_index, first)
    } else {
        let Some(requested_name) = requested_name else {
            return Err(OperationError::OperationNameRequired);
        };
        std::iter::once((first_index, first))
            .chain(operations)
            .find(|(_, operation)| operation_name(operation) == Some(requested_name))
            .ok_or_else(|| OperationError::OperationNotFound(requested_name.to_string()))?
    };

    Ok(SelectedOperation {
        index: selected.0,
        kind: OperationKind::of(selected.1),
        name: operation_name(selected.1).map(str::to_string),
    })
}
