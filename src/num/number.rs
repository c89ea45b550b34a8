//! Parsing and formatting of JSON number spans.
//!
//! The scanner guarantees a number span matches the RFC 8259 grammar, but
//! the span is only decoded here, lazily. Range overflow (an integer span
//! outside `i64`) is therefore a decode-time error, not a parse-time one.

use crate::error::DecodeError;

/// Parses an ASCII digit span with optional leading `-` into an `i64`.
pub fn parse_integer(bytes: &[u8]) -> Result<i64, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| malformed(bytes))?;
    text.parse::<i64>().map_err(|_| malformed(bytes))
}

/// Parses an ASCII span (digits, optional fraction, optional exponent) into
/// an `f64`.
pub fn parse_float(bytes: &[u8]) -> Result<f64, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|_| malformed(bytes))?;
    text.parse::<f64>().map_err(|_| malformed(bytes))
}

fn malformed(bytes: &[u8]) -> DecodeError {
    DecodeError::MalformedNumber(String::from_utf8_lossy(bytes).into_owned())
}

pub fn write_integer(out: &mut Vec<u8>, value: i64) {
    let mut buffer = itoa::Buffer::new();
    out.extend_from_slice(buffer.format(value).as_bytes());
}

/// Writes a finite `f64`. Ryu always emits a fraction or an exponent, so a
/// reparse of the written span picks the float kind again.
pub fn write_float(out: &mut Vec<u8>, value: f64) {
    debug_assert!(value.is_finite());
    let mut buffer = ryu::Buffer::new();
    out.extend_from_slice(buffer.format(value).as_bytes());
}
