//! The description tape: a compact binary index paralleling the JSON text.
//!
//! The tape is a flat `Vec<u32>` holding one entry per JSON value, in tree
//! pre-order. The first word of every entry packs the value kind into the
//! top four bits and the value's byte offset into the low 28. Literals need
//! nothing else; strings and numbers carry one extra word for their byte
//! length; containers carry three extra words: byte length, child count,
//! and the subtree span in index words. The span makes skipping a whole
//! subtree a single addition, so reaching the k-th child of a container
//! costs k hops regardless of how large the skipped subtrees are.

use smallvec::SmallVec;

pub(crate) const KIND_SHIFT: u32 = 28;
const OFFSET_MASK: u32 = (1 << KIND_SHIFT) - 1;

/// Largest byte offset the packed entry word can address.
pub(crate) const OFFSET_LIMIT: usize = 1 << KIND_SHIFT;

/// Words occupied by a container header (word0, byte length, child count,
/// subtree span).
pub(crate) const CONTAINER_WORDS: usize = 4;
/// Words occupied by a string or number entry (word0, byte length).
pub(crate) const SCALAR_WORDS: usize = 2;
/// Words occupied by a `true`/`false`/`null` entry.
pub(crate) const LITERAL_WORDS: usize = 1;

/// The kind tag of one tape entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Object,
    Array,
    String,
    EscapedString,
    Integer,
    Float,
    True,
    False,
    Null,
}

impl Kind {
    fn tag(self) -> u32 {
        self as u32
    }

    fn from_tag(tag: u32) -> Self {
        match tag {
            0 => Kind::Object,
            1 => Kind::Array,
            2 => Kind::String,
            3 => Kind::EscapedString,
            4 => Kind::Integer,
            5 => Kind::Float,
            6 => Kind::True,
            7 => Kind::False,
            8 => Kind::Null,
            _ => unreachable!("corrupt tape entry tag {tag}"),
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, Kind::Object | Kind::Array)
    }

    fn is_literal(self) -> bool {
        matches!(self, Kind::True | Kind::False | Kind::Null)
    }

    /// Byte length of the fixed JSON keyword for a literal kind.
    fn literal_len(self) -> usize {
        match self {
            Kind::True | Kind::Null => 4,
            Kind::False => 5,
            _ => unreachable!("{self:?} has no fixed keyword length"),
        }
    }

    fn entry_words(self) -> usize {
        if self.is_container() {
            CONTAINER_WORDS
        } else if self.is_literal() {
            LITERAL_WORDS
        } else {
            SCALAR_WORDS
        }
    }
}

/// One value's exact span in the text buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub offset: usize,
    pub len: usize,
}

impl Bounds {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

fn head(kind: Kind, offset: usize) -> u32 {
    assert!(
        offset < OFFSET_LIMIT,
        "document exceeds the maximum indexable size ({OFFSET_LIMIT} bytes)"
    );
    (kind.tag() << KIND_SHIFT) | offset as u32
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Tape {
    words: Vec<u32>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total length in index words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn kind_at(&self, at: usize) -> Kind {
        Kind::from_tag(self.words[at] >> KIND_SHIFT)
    }

    pub fn offset_at(&self, at: usize) -> usize {
        (self.words[at] & OFFSET_MASK) as usize
    }

    pub fn bounds_at(&self, at: usize) -> Bounds {
        let kind = self.kind_at(at);
        let len = if kind.is_literal() {
            kind.literal_len()
        } else {
            self.words[at + 1] as usize
        };
        Bounds {
            offset: self.offset_at(at),
            len,
        }
    }

    pub fn child_count_at(&self, at: usize) -> usize {
        debug_assert!(self.kind_at(at).is_container());
        self.words[at + 2] as usize
    }

    /// Subtree span in index words, header included.
    pub fn span_at(&self, at: usize) -> usize {
        let kind = self.kind_at(at);
        if kind.is_container() {
            self.words[at + 3] as usize
        } else {
            kind.entry_words()
        }
    }

    /// Advances past one entry and its entire subtree.
    pub fn skip_subtree(&self, at: usize) -> usize {
        at + self.span_at(at)
    }

    pub fn describe_scalar(&mut self, kind: Kind, bounds: Bounds) {
        debug_assert!(!kind.is_container() && !kind.is_literal());
        self.words.push(head(kind, bounds.offset));
        self.words.push(bounds.len as u32);
    }

    pub fn describe_literal(&mut self, kind: Kind, offset: usize) {
        debug_assert!(kind.is_literal());
        self.words.push(head(kind, offset));
    }

    /// Reserves a container header at the current write position. The final
    /// size fields are filled in by [`Tape::complete_container`] once the
    /// content is known.
    pub fn begin_container(&mut self, kind: Kind, offset: usize) -> usize {
        debug_assert!(kind.is_container());
        let at = self.words.len();
        self.words.push(head(kind, offset));
        self.words.extend_from_slice(&[0, 0, 0]);
        at
    }

    /// Completes a reserved header. Every descendant entry must already have
    /// been written, so the subtree span is the distance from the header to
    /// the current write position.
    pub fn complete_container(&mut self, handle: usize, child_count: usize, byte_len: usize) {
        self.words[handle + 1] = byte_len as u32;
        self.words[handle + 2] = child_count as u32;
        self.words[handle + 3] = (self.words.len() - handle) as u32;
    }

    /// Adjusts one container header after its contents changed size.
    /// `child_delta` applies only to the container itself; callers walk the
    /// ancestor chain applying the byte and word deltas at every level.
    pub fn grow_container(
        &mut self,
        at: usize,
        child_delta: isize,
        byte_delta: isize,
        word_delta: isize,
    ) {
        debug_assert!(self.kind_at(at).is_container());
        self.words[at + 1] = (self.words[at + 1] as isize + byte_delta) as u32;
        self.words[at + 2] = (self.words[at + 2] as isize + child_delta) as u32;
        self.words[at + 3] = (self.words[at + 3] as isize + word_delta) as u32;
    }

    /// The chain of container headers whose subtree contains `target`,
    /// outermost first, ending with the entry at `target` itself. The root
    /// entry must be a container and `target` must be a valid entry
    /// position; anything else is a caller bug.
    pub fn enclosing_containers(&self, target: usize) -> SmallVec<[usize; 8]> {
        let mut chain = SmallVec::new();
        let mut at = 0;
        loop {
            chain.push(at);
            if at == target {
                return chain;
            }
            let mut child = at + CONTAINER_WORDS;
            loop {
                let end = self.skip_subtree(child);
                if target < end {
                    break;
                }
                child = end;
            }
            if !self.kind_at(child).is_container() {
                debug_assert_eq!(child, target, "target is not an entry boundary");
                chain.push(child);
                return chain;
            }
            at = child;
        }
    }

    /// Extracts one contiguous subtree as an independent tape. Offsets stay
    /// relative to the original buffer until the caller rebases them.
    pub fn slice(&self, at: usize) -> Tape {
        Tape {
            words: self.words[at..self.skip_subtree(at)].to_vec(),
        }
    }

    /// Adds `delta` to every entry's byte offset.
    pub fn rebase_offsets(&mut self, delta: isize) {
        self.shift_offsets_from(0, delta);
    }

    /// Adds `delta` to the byte offset of every entry at or after the entry
    /// boundary `from`. Container size fields are untouched; those belong to
    /// headers before the boundary and are adjusted separately.
    pub fn shift_offsets_from(&mut self, from: usize, delta: isize) {
        let mut at = from;
        while at < self.words.len() {
            let kind = self.kind_at(at);
            let offset = (self.offset_at(at) as isize + delta) as usize;
            self.words[at] = head(kind, offset);
            at += kind.entry_words();
        }
    }

    /// Splices a fully formed, self-relative subtree into this tape at word
    /// position `at`, rebasing every offset inside it by `at_json_offset`.
    pub fn append_rebased(&mut self, at: usize, child: &Tape, at_json_offset: usize) {
        let mut sub = child.clone();
        sub.shift_offsets_from(0, at_json_offset as isize);
        self.words.splice(at..at, sub.words);
    }

    /// Discards the subtree at `at` and replaces it with a self-relative
    /// subtree rebased to `at_json_offset`. The replacement may differ in
    /// kind, size, and child count.
    pub fn replace_subtree(&mut self, at: usize, replacement: &Tape, at_json_offset: usize) {
        let end = self.skip_subtree(at);
        let mut sub = replacement.clone();
        sub.shift_offsets_from(0, at_json_offset as isize);
        self.words.splice(at..end, sub.words);
    }

    /// Deletes the subtree at `at` outright. Offset shifting and ancestor
    /// bookkeeping are the caller's responsibility, as with the other
    /// splicing primitives.
    pub fn remove_subtree(&mut self, at: usize) -> usize {
        let end = self.skip_subtree(at);
        self.words.drain(at..end);
        end - at
    }
}
