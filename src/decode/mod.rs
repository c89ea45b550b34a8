mod scanner;

use crate::error::Result;
use crate::Document;

/// Containers deeper than this are rejected at parse time.
pub(crate) const MAX_DEPTH: usize = 256;

/// Scans `input` into a document: the verbatim bytes plus a description
/// tape satisfying the offset-consistency invariants. No partial state is
/// ever committed; an error leaves nothing behind.
pub(crate) fn parse(input: &[u8]) -> Result<Document> {
    let tape = scanner::Scanner::new(input).scan_document()?;
    Ok(Document::from_parts(input.to_vec(), tape))
}
