//! In-place mutable JSON documents backed by a compact tape index.
//!
//! A [`Document`] keeps the raw JSON text alongside a binary description
//! of its tree (one tape entry per value, recording kind, byte offset, and
//! length). Reads decode lazily from the tape, one value at a time, and
//! mutations splice text and tape together, so the document text is always
//! valid JSON and [`Document::to_bytes`] never re-serializes.
//!
//! ```
//! use jsondoc::{parse_str, JsonArray, Value};
//!
//! let mut array = JsonArray::new();
//! array.append(1i64);
//! array.append("a");
//! assert_eq!(array.to_text().unwrap(), r#"[1,"a"]"#);
//!
//! array.set(0, true);
//! assert_eq!(array.get(0).unwrap(), Value::Bool(true));
//!
//! let doc = parse_str(r#"[10, 20, 30]"#).unwrap();
//! let parsed = doc.into_array().unwrap();
//! assert_eq!(parsed.get(2).unwrap(), Value::Int(30));
//! ```

pub mod error;
pub mod text;

mod decode;
mod document;
mod encode;
mod num;
mod tape;
mod value;

pub use document::{Document, JsonArray, JsonObject};
pub use error::{DecodeError, Error, Location, ParseErrorKind, Result};
pub use value::Value;

/// Scans raw bytes into a [`Document`]. The top level must be an array or
/// an object.
pub fn parse(input: &[u8]) -> Result<Document> {
    decode::parse(input)
}

/// [`parse`] for string input.
pub fn parse_str(input: &str) -> Result<Document> {
    decode::parse(input.as_bytes())
}
