//! Documents and their typed facades.
//!
//! A [`Document`] owns the JSON text and its description tape as one
//! aggregate; the two are only ever mutated together, inside a single
//! critical section, so every transition observes the offset-consistency
//! invariant. [`JsonArray`] and [`JsonObject`] are the typed views over a
//! document whose root is the matching container kind.
//!
//! Documents are value types under copy-on-write: cloning shares storage,
//! and the first mutation on a shared document clones the buffers first.
//! Sub-documents returned by `get` own independent copies of their span,
//! never aliases into the parent.

use std::fmt;
use std::sync::Arc;

use crate::decode;
use crate::encode::ValueWriter;
use crate::error::{DecodeError, Result};
use crate::num::{parse_float, parse_integer};
use crate::tape::{Kind, Tape, CONTAINER_WORDS};
use crate::text::unescape;
use crate::value::Value;

#[derive(Debug, Clone)]
struct Shared {
    text: Vec<u8>,
    tape: Tape,
}

/// A JSON document: raw text plus the tape indexing it.
#[derive(Debug, Clone)]
pub struct Document {
    shared: Arc<Shared>,
}

impl Document {
    /// Scans raw bytes into a document. The input must hold an array or an
    /// object at the top level.
    pub fn parse(input: &[u8]) -> Result<Self> {
        decode::parse(input)
    }

    pub(crate) fn from_parts(text: Vec<u8>, tape: Tape) -> Self {
        Self {
            shared: Arc::new(Shared { text, tape }),
        }
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.shared.text
    }

    pub(crate) fn tape(&self) -> &Tape {
        &self.shared.tape
    }

    /// The raw JSON bytes, verbatim. The buffer is kept valid JSON across
    /// every mutation, so reading never re-serializes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.shared.text
    }

    /// The document text as UTF-8. Parsed input is not validated eagerly,
    /// so this can fail on documents with invalid UTF-8 inside strings.
    pub fn to_text(&self) -> Result<&str> {
        std::str::from_utf8(&self.shared.text).map_err(|_| DecodeError::InvalidUtf8.into())
    }

    pub fn is_array(&self) -> bool {
        self.shared.tape.kind_at(0) == Kind::Array
    }

    pub fn is_object(&self) -> bool {
        self.shared.tape.kind_at(0) == Kind::Object
    }

    pub fn into_array(self) -> Option<JsonArray> {
        self.is_array().then_some(JsonArray { doc: self })
    }

    pub fn into_object(self) -> Option<JsonObject> {
        self.is_object().then_some(JsonObject { doc: self })
    }

    fn shared_mut(&mut self) -> &mut Shared {
        Arc::make_mut(&mut self.shared)
    }

    fn child_count(&self) -> usize {
        self.shared.tape.child_count_at(0)
    }

    /// Word position of the root's n-th child entry, counting object keys
    /// and values as separate entries. Costs n subtree skips.
    fn entry_at(&self, n: usize) -> usize {
        let tape = &self.shared.tape;
        let mut at = CONTAINER_WORDS;
        for _ in 0..n {
            at = tape.skip_subtree(at);
        }
        at
    }

    /// Lazily decodes the entry at `at` into a typed value. Never touches
    /// sibling entries.
    fn materialize(&self, at: usize) -> Result<Value> {
        let shared = &*self.shared;
        let bounds = shared.tape.bounds_at(at);
        let bytes = &shared.text[bounds.offset..bounds.end()];
        let value = match shared.tape.kind_at(at) {
            Kind::Null => Value::Null,
            Kind::True => Value::Bool(true),
            Kind::False => Value::Bool(false),
            Kind::Integer => Value::Int(parse_integer(bytes)?),
            Kind::Float => Value::Float(parse_float(bytes)?),
            Kind::String => {
                let body = &bytes[1..bytes.len() - 1];
                let text = std::str::from_utf8(body).map_err(|_| DecodeError::InvalidUtf8)?;
                Value::String(text.to_owned())
            }
            Kind::EscapedString => Value::String(unescape(&bytes[1..bytes.len() - 1])?),
            Kind::Array => Value::Array(JsonArray {
                doc: self.slice_at(at),
            }),
            Kind::Object => Value::Object(JsonObject {
                doc: self.slice_at(at),
            }),
        };
        Ok(value)
    }

    fn materialize_string(&self, at: usize) -> Result<String> {
        match self.materialize(at)? {
            Value::String(text) => Ok(text),
            other => unreachable!("key entry materialized as {other:?}"),
        }
    }

    /// Cuts the subtree at `at` out into an independent document: both
    /// buffers are copied and the tape is rebased to the new sub-buffer.
    fn slice_at(&self, at: usize) -> Document {
        let bounds = self.shared.tape.bounds_at(at);
        let text = self.shared.text[bounds.offset..bounds.end()].to_vec();
        let mut tape = self.shared.tape.slice(at);
        tape.rebase_offsets(-(bounds.offset as isize));
        Document::from_parts(text, tape)
    }

    /// Splices a serialized fragment in just before the root's closing
    /// delimiter, with a separating comma unless this is the first child.
    /// Prior siblings never move; only the root's own span grows.
    fn append_fragment(&mut self, payload: &[u8], fragment: &Tape, pairs: bool) {
        let shared = self.shared_mut();
        let expected = if pairs { Kind::Object } else { Kind::Array };
        debug_assert_eq!(shared.tape.kind_at(0), expected);
        let root = shared.tape.bounds_at(0);
        let close = root.end() - 1;
        let lead = usize::from(shared.tape.child_count_at(0) > 0);
        let mut chunk = Vec::with_capacity(lead + payload.len());
        if lead == 1 {
            chunk.push(b',');
        }
        chunk.extend_from_slice(payload);
        let byte_delta = chunk.len() as isize;
        shared.text.splice(close..close, chunk);

        let at = shared.tape.skip_subtree(0);
        shared.tape.append_rebased(at, fragment, close + lead);
        let chain = shared.tape.enclosing_containers(0);
        let (&target, ancestors) = chain.split_last().expect("root entry");
        for &header in ancestors {
            shared
                .tape
                .grow_container(header, 0, byte_delta, fragment.len() as isize);
        }
        shared
            .tape
            .grow_container(target, 1, byte_delta, fragment.len() as isize);
    }

    /// Replaces the value at `at` wholesale: new text spliced over the old
    /// span, the old subtree discarded and rebuilt from the new value's
    /// shape, and the net delta shifted through every later entry and
    /// ancestor header. Old and new may differ in kind, size, and arity.
    fn rewrite_entry(&mut self, at: usize, value: &Value) {
        let mut writer = ValueWriter::new();
        writer.write_value(value);
        let (payload, fragment) = writer.finish();

        let shared = self.shared_mut();
        let old = shared.tape.bounds_at(at);
        let old_span = shared.tape.span_at(at);
        let mut chain = shared.tape.enclosing_containers(at);
        chain.pop();

        shared
            .text
            .splice(old.offset..old.end(), payload.iter().copied());
        let byte_delta = payload.len() as isize - old.len as isize;
        let word_delta = fragment.len() as isize - old_span as isize;
        shared.tape.replace_subtree(at, &fragment, old.offset);
        shared.tape.shift_offsets_from(at + fragment.len(), byte_delta);
        for &header in chain.iter() {
            shared.tape.grow_container(header, 0, byte_delta, word_delta);
        }
    }

    /// Removes `entries` consecutive entry subtrees starting at `first`
    /// together with the text range `[text_from, text_to)`, then shifts
    /// later offsets backward and shrinks the ancestor chain. The caller
    /// chooses the text range so the separating comma goes with the value.
    fn remove_entries(&mut self, first: usize, entries: usize, text_from: usize, text_to: usize) {
        let mut chain = self.shared.tape.enclosing_containers(first);
        chain.pop();
        let &parent = chain.last().expect("removed entry has a parent");

        let shared = self.shared_mut();
        shared.text.drain(text_from..text_to);
        let byte_delta = -((text_to - text_from) as isize);
        let mut removed_words = 0;
        for _ in 0..entries {
            removed_words += shared.tape.remove_subtree(first);
        }
        shared.tape.shift_offsets_from(first, byte_delta);
        for &header in chain.iter() {
            shared
                .tape
                .grow_container(header, 0, byte_delta, -(removed_words as isize));
        }
        shared.tape.grow_container(parent, -1, 0, 0);
    }
}

fn serialize(value: &Value) -> (Vec<u8>, Tape) {
    let mut writer = ValueWriter::new();
    writer.write_value(value);
    writer.finish()
}

/// A document whose root is a JSON array.
#[derive(Debug, Clone)]
pub struct JsonArray {
    doc: Document,
}

impl JsonArray {
    /// The empty array literal `[]`.
    pub fn new() -> Self {
        let mut tape = Tape::new();
        let header = tape.begin_container(Kind::Array, 0);
        tape.complete_container(header, 0, 2);
        Self {
            doc: Document::from_parts(b"[]".to_vec(), tape),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn to_bytes(&self) -> &[u8] {
        self.doc.to_bytes()
    }

    pub fn to_text(&self) -> Result<&str> {
        self.doc.to_text()
    }

    /// Number of elements, read from the root header.
    pub fn count(&self) -> usize {
        self.doc.child_count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn append(&mut self, value: impl Into<Value>) {
        let (payload, fragment) = serialize(&value.into());
        self.doc.append_fragment(&payload, &fragment, false);
    }

    pub fn get(&self, index: usize) -> Result<Value> {
        self.check(index);
        self.doc.materialize(self.doc.entry_at(index))
    }

    pub fn set(&mut self, index: usize, value: impl Into<Value>) {
        self.check(index);
        let at = self.doc.entry_at(index);
        self.doc.rewrite_entry(at, &value.into());
    }

    pub fn remove(&mut self, index: usize) {
        self.check(index);
        let count = self.count();
        let at = self.doc.entry_at(index);
        let tape = self.doc.tape();
        let bounds = tape.bounds_at(at);
        let (from, to) = if count == 1 {
            (bounds.offset, bounds.end())
        } else if index == 0 {
            // First of several: the following comma goes with it.
            (bounds.offset, tape.offset_at(tape.skip_subtree(at)))
        } else {
            // Otherwise the preceding comma does.
            let prev = self.doc.entry_at(index - 1);
            (tape.bounds_at(prev).end(), bounds.end())
        };
        self.doc.remove_entries(at, 1, from, to);
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Value>> + '_ {
        (0..self.count()).map(move |index| self.get(index))
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.count(),
            "index {index} out of bounds for array of {}",
            self.count()
        );
    }
}

impl Default for JsonArray {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Into<Value>> FromIterator<V> for JsonArray {
    fn from_iter<I: IntoIterator<Item = V>>(values: I) -> Self {
        let mut array = Self::new();
        for value in values {
            array.append(value);
        }
        array
    }
}

impl PartialEq for JsonArray {
    fn eq(&self, other: &Self) -> bool {
        self.count() == other.count()
            && (0..self.count()).all(|i| match (self.get(i), other.get(i)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            })
    }
}

impl fmt::Display for JsonArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.to_bytes()))
    }
}

/// A document whose root is a JSON object. Members keep insertion order;
/// keys are not deduplicated.
#[derive(Debug, Clone)]
pub struct JsonObject {
    doc: Document,
}

impl JsonObject {
    /// The empty object literal `{}`.
    pub fn new() -> Self {
        let mut tape = Tape::new();
        let header = tape.begin_container(Kind::Object, 0);
        tape.complete_container(header, 0, 2);
        Self {
            doc: Document::from_parts(b"{}".to_vec(), tape),
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn to_bytes(&self) -> &[u8] {
        self.doc.to_bytes()
    }

    pub fn to_text(&self) -> Result<&str> {
        self.doc.to_text()
    }

    /// Number of key/value pairs, read from the root header.
    pub fn count(&self) -> usize {
        self.doc.child_count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn append(&mut self, key: &str, value: impl Into<Value>) {
        let mut writer = ValueWriter::new();
        writer.write_pair(key, &value.into());
        let (payload, fragment) = writer.finish();
        self.doc.append_fragment(&payload, &fragment, true);
    }

    /// The key of the pair at `index`.
    pub fn key(&self, index: usize) -> Result<String> {
        self.check(index);
        self.doc.materialize_string(self.doc.entry_at(2 * index))
    }

    /// The value of the pair at `index`.
    pub fn get(&self, index: usize) -> Result<Value> {
        self.check(index);
        self.doc.materialize(self.doc.entry_at(2 * index + 1))
    }

    /// Linear scan for the first pair with the given key.
    pub fn value_of(&self, key: &str) -> Result<Option<Value>> {
        for index in 0..self.count() {
            if self.key(index)? == key {
                return Ok(Some(self.get(index)?));
            }
        }
        Ok(None)
    }

    /// Rewrites the value of the pair at `index`; the key stays.
    pub fn set(&mut self, index: usize, value: impl Into<Value>) {
        self.check(index);
        let at = self.doc.entry_at(2 * index + 1);
        self.doc.rewrite_entry(at, &value.into());
    }

    /// Removes the pair at `index`, key and value together.
    pub fn remove(&mut self, index: usize) {
        self.check(index);
        let count = self.count();
        let key_at = self.doc.entry_at(2 * index);
        let tape = self.doc.tape();
        let key_bounds = tape.bounds_at(key_at);
        let value_end = tape.bounds_at(self.doc.entry_at(2 * index + 1)).end();
        let (from, to) = if count == 1 {
            (key_bounds.offset, value_end)
        } else if index == 0 {
            let next_key = self.doc.entry_at(2);
            (key_bounds.offset, tape.offset_at(next_key))
        } else {
            let prev_value_end = tape.bounds_at(self.doc.entry_at(2 * index - 1)).end();
            (prev_value_end, value_end)
        };
        self.doc.remove_entries(key_at, 2, from, to);
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<(String, Value)>> + '_ {
        (0..self.count()).map(move |index| Ok((self.key(index)?, self.get(index)?)))
    }

    fn check(&self, index: usize) {
        assert!(
            index < self.count(),
            "index {index} out of bounds for object of {}",
            self.count()
        );
    }
}

impl Default for JsonObject {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for JsonObject {
    fn eq(&self, other: &Self) -> bool {
        if self.count() != other.count() {
            return false;
        }
        (0..self.count()).all(|i| {
            matches!(
                (self.key(i), other.key(i), self.get(i), other.get(i)),
                (Ok(ka), Ok(kb), Ok(va), Ok(vb)) if ka == kb && va == vb
            )
        })
    }
}

impl fmt::Display for JsonObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_literals() {
        let array = JsonArray::new();
        assert_eq!(array.to_bytes(), b"[]");
        assert_eq!(array.count(), 0);

        let object = JsonObject::new();
        assert_eq!(object.to_bytes(), b"{}");
        assert_eq!(object.count(), 0);
    }

    #[test]
    fn sub_documents_are_copies_not_aliases() {
        let mut outer = JsonArray::new();
        let inner: JsonArray = [1i64, 2].into_iter().collect();
        outer.append(inner);

        let Ok(Value::Array(mut copy)) = outer.get(0) else {
            panic!("expected a sub-array");
        };
        copy.append(3i64);
        assert_eq!(copy.to_bytes(), b"[1,2,3]");
        // The parent is untouched by mutating the slice.
        assert_eq!(outer.to_bytes(), b"[[1,2]]");
    }

    #[test]
    fn clones_are_copy_on_write() {
        let mut a: JsonArray = [1i64, 2].into_iter().collect();
        let b = a.clone();
        a.append(3i64);
        assert_eq!(a.to_bytes(), b"[1,2,3]");
        assert_eq!(b.to_bytes(), b"[1,2]");
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_past_the_end_is_a_caller_error() {
        let array = JsonArray::new();
        let _ = array.get(0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn remove_past_the_end_is_a_caller_error() {
        let mut object = JsonObject::new();
        object.append("a", 1i64);
        object.remove(1);
    }

    #[test]
    fn parsed_documents_expose_their_root_kind() {
        let doc = Document::parse(b"[1]").unwrap();
        assert!(doc.is_array() && !doc.is_object());
        let array = doc.into_array().unwrap();
        assert_eq!(array.get(0).unwrap(), Value::Int(1));

        let doc = Document::parse(b"{}").unwrap();
        assert!(doc.clone().into_array().is_none());
        assert!(doc.into_object().is_some());
    }
}
