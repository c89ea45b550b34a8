//! Serializes values into `(bytes, tape)` fragments.
//!
//! The writer produces both halves of a document fragment at once: the JSON
//! text and the description entries for it, with all offsets relative to
//! the fragment start. Facades splice the fragment into a document and
//! rebase it in one step.

use crate::num::{write_float, write_integer};
use crate::tape::{Bounds, Kind, Tape};
use crate::text::escape;
use crate::value::Value;
use crate::Document;

pub(crate) struct ValueWriter {
    out: Vec<u8>,
    tape: Tape,
}

impl ValueWriter {
    pub fn new() -> Self {
        Self {
            out: Vec::new(),
            tape: Tape::new(),
        }
    }

    pub fn finish(self) -> (Vec<u8>, Tape) {
        (self.out, self.tape)
    }

    /// Writes one object member: a quoted key entry, the colon, and the
    /// value entry. The colon byte belongs to the container's text, not to
    /// either entry's bounds.
    pub fn write_pair(&mut self, key: &str, value: &Value) {
        self.write_string(key);
        self.out.push(b':');
        self.write_value(value);
    }

    pub fn write_value(&mut self, value: &Value) {
        let offset = self.out.len();
        match value {
            Value::Null => {
                self.out.extend_from_slice(b"null");
                self.tape.describe_literal(Kind::Null, offset);
            }
            Value::Bool(true) => {
                self.out.extend_from_slice(b"true");
                self.tape.describe_literal(Kind::True, offset);
            }
            Value::Bool(false) => {
                self.out.extend_from_slice(b"false");
                self.tape.describe_literal(Kind::False, offset);
            }
            Value::Int(i) => {
                write_integer(&mut self.out, *i);
                self.describe_span(Kind::Integer, offset);
            }
            Value::Float(f) => {
                assert!(f.is_finite(), "cannot encode a non-finite number as JSON");
                write_float(&mut self.out, *f);
                self.describe_span(Kind::Float, offset);
            }
            Value::String(s) => self.write_string(s),
            Value::Array(array) => self.write_document(array.document()),
            Value::Object(object) => self.write_document(object.document()),
        }
    }

    fn write_string(&mut self, text: &str) {
        let offset = self.out.len();
        let (escaped, body) = escape(text);
        self.out.push(b'"');
        self.out.extend_from_slice(&body);
        self.out.push(b'"');
        let kind = if escaped {
            Kind::EscapedString
        } else {
            Kind::String
        };
        self.describe_span(kind, offset);
    }

    /// Splices a nested document: its root span of text verbatim, and its
    /// description subtree rebased to this fragment.
    fn write_document(&mut self, doc: &Document) {
        let offset = self.out.len();
        let root = doc.tape().bounds_at(0);
        self.out
            .extend_from_slice(&doc.bytes()[root.offset..root.end()]);
        let mut sub = doc.tape().slice(0);
        sub.rebase_offsets(-(root.offset as isize));
        let at = self.tape.len();
        self.tape.append_rebased(at, &sub, offset);
    }

    fn describe_span(&mut self, kind: Kind, offset: usize) {
        self.tape.describe_scalar(
            kind,
            Bounds {
                offset,
                len: self.out.len() - offset,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_carry_matching_entries() {
        let mut writer = ValueWriter::new();
        writer.write_value(&Value::Int(42));
        let (bytes, tape) = writer.finish();
        assert_eq!(bytes, b"42");
        assert_eq!(tape.kind_at(0), Kind::Integer);
        assert_eq!(tape.bounds_at(0), Bounds { offset: 0, len: 2 });
    }

    #[test]
    fn strings_are_tagged_by_escaping_need() {
        let mut writer = ValueWriter::new();
        writer.write_value(&Value::String("plain".into()));
        writer.write_value(&Value::String("two\nlines".into()));
        let (bytes, tape) = writer.finish();
        assert_eq!(bytes, b"\"plain\"\"two\\nlines\"");
        assert_eq!(tape.kind_at(0), Kind::String);
        assert_eq!(tape.kind_at(2), Kind::EscapedString);
        assert_eq!(tape.bounds_at(2), Bounds { offset: 7, len: 12 });
    }

    #[test]
    fn pairs_interleave_key_and_value_entries() {
        let mut writer = ValueWriter::new();
        writer.write_pair("k", &Value::Bool(true));
        let (bytes, tape) = writer.finish();
        assert_eq!(bytes, b"\"k\":true");
        assert_eq!(tape.kind_at(0), Kind::String);
        assert_eq!(tape.bounds_at(0), Bounds { offset: 0, len: 3 });
        assert_eq!(tape.kind_at(2), Kind::True);
        assert_eq!(tape.bounds_at(2), Bounds { offset: 4, len: 4 });
    }

    #[test]
    #[should_panic(expected = "non-finite")]
    fn non_finite_floats_fail_fast() {
        let mut writer = ValueWriter::new();
        writer.write_value(&Value::Float(f64::NAN));
    }
}
