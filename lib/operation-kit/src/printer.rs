use std::fmt::{self, Write};

use graphql_parser::query::Document;
use xxhash_rust::xxh3::Xxh3;

use crate::normalization::error::NormalizationError;

/// Feeds printed text straight into a hasher, without building the string.
pub struct HashWriter<'a> {
    hasher: &'a mut Xxh3,
}

impl<'a> HashWriter<'a> {
    pub fn new(hasher: &'a mut Xxh3) -> Self {
        Self { hasher }
    }
}

impl Write for HashWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.hasher.update(s.as_bytes());
        Ok(())
    }
}

/// xxh3 of the printed document. The hasher is reset first.
pub fn hash_document(
    hasher: &mut Xxh3,
    document: &Document<'static, String>,
) -> Result<u64, NormalizationError> {
    hasher.reset();
    write!(HashWriter::new(hasher), "{}", document).map_err(|_| NormalizationError::PrintFailed)?;
    Ok(hasher.digest())
}

/// Prints the document into `out`, replacing its previous content.
pub fn print_document(
    out: &mut String,
    document: &Document<'static, String>,
) -> Result<(), NormalizationError> {
    out.clear();
    write!(out, "{}", document).map_err(|_| NormalizationError::PrintFailed)
}
