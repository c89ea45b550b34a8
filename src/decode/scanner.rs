//! Recursive-descent scanner producing a description tape over input bytes.
//!
//! The scanner validates structure (delimiters, literals, the number
//! grammar, string termination) and records every value's exact byte span.
//! It does not decode anything: escape contents, UTF-8, and number ranges
//! are checked lazily when a value is materialized. On any error the tape
//! is discarded, so a parse either yields a fully consistent description or
//! nothing.

use memchr::memchr2;

use crate::decode::MAX_DEPTH;
use crate::error::{Error, Location, ParseErrorKind, Result};
use crate::tape::{Bounds, Kind, Tape};

pub(crate) struct Scanner<'a> {
    input: &'a [u8],
    position: usize,
    depth: usize,
    tape: Tape,
}

impl<'a> Scanner<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            depth: 0,
            tape: Tape::new(),
        }
    }

    pub fn scan_document(mut self) -> Result<Tape> {
        self.skip_whitespace();
        match self.peek() {
            Some(b'[') => self.scan_array()?,
            Some(b'{') => self.scan_object()?,
            Some(_) => return self.fail(ParseErrorKind::ExpectedContainer, self.position),
            None => return self.fail(ParseErrorKind::UnexpectedEndOfInput, self.position),
        }
        self.skip_whitespace();
        if self.position != self.input.len() {
            return self.fail(ParseErrorKind::TrailingCharacters, self.position);
        }
        Ok(self.tape)
    }

    fn scan_value(&mut self) -> Result<()> {
        match self.peek() {
            Some(b'[') => self.scan_array(),
            Some(b'{') => self.scan_object(),
            Some(b'"') => self.scan_string(),
            Some(b't') => self.scan_literal(b"true", Kind::True),
            Some(b'f') => self.scan_literal(b"false", Kind::False),
            Some(b'n') => self.scan_literal(b"null", Kind::Null),
            Some(b'-' | b'0'..=b'9') => self.scan_number(),
            Some(other) => self.fail(ParseErrorKind::UnexpectedCharacter(other as char), self.position),
            None => self.fail(ParseErrorKind::UnexpectedEndOfInput, self.position),
        }
    }

    fn scan_array(&mut self) -> Result<()> {
        self.enter()?;
        let start = self.position;
        let header = self.tape.begin_container(Kind::Array, start);
        self.position += 1;
        self.skip_whitespace();
        let mut count = 0;
        if self.peek() == Some(b']') {
            self.position += 1;
        } else {
            loop {
                self.scan_value()?;
                count += 1;
                self.skip_whitespace();
                match self.next()? {
                    b',' => self.skip_whitespace(),
                    b']' => break,
                    other => {
                        return self
                            .fail(ParseErrorKind::UnexpectedCharacter(other as char), self.position - 1)
                    }
                }
            }
        }
        self.tape.complete_container(header, count, self.position - start);
        self.depth -= 1;
        Ok(())
    }

    fn scan_object(&mut self) -> Result<()> {
        self.enter()?;
        let start = self.position;
        let header = self.tape.begin_container(Kind::Object, start);
        self.position += 1;
        self.skip_whitespace();
        let mut count = 0;
        if self.peek() == Some(b'}') {
            self.position += 1;
        } else {
            loop {
                if self.peek() != Some(b'"') {
                    let offset = self.position;
                    return match self.peek() {
                        Some(other) => {
                            self.fail(ParseErrorKind::UnexpectedCharacter(other as char), offset)
                        }
                        None => self.fail(ParseErrorKind::UnexpectedEndOfInput, offset),
                    };
                }
                self.scan_string()?;
                self.skip_whitespace();
                match self.next()? {
                    b':' => {}
                    other => {
                        return self
                            .fail(ParseErrorKind::UnexpectedCharacter(other as char), self.position - 1)
                    }
                }
                self.skip_whitespace();
                self.scan_value()?;
                count += 1;
                self.skip_whitespace();
                match self.next()? {
                    b',' => self.skip_whitespace(),
                    b'}' => break,
                    other => {
                        return self
                            .fail(ParseErrorKind::UnexpectedCharacter(other as char), self.position - 1)
                    }
                }
            }
        }
        self.tape.complete_container(header, count, self.position - start);
        self.depth -= 1;
        Ok(())
    }

    fn scan_string(&mut self) -> Result<()> {
        let start = self.position;
        self.position += 1;
        let mut escaped = false;
        loop {
            let rest = &self.input[self.position..];
            let Some(pos) = memchr2(b'"', b'\\', rest) else {
                return self.fail(ParseErrorKind::UnterminatedString, start);
            };
            if let Some(ctl) = rest[..pos].iter().position(|b| *b < 0x20) {
                return self.fail(
                    ParseErrorKind::ControlCharacterInString,
                    self.position + ctl,
                );
            }
            self.position += pos;
            if self.input[self.position] == b'"' {
                self.position += 1;
                let kind = if escaped { Kind::EscapedString } else { Kind::String };
                self.tape.describe_scalar(
                    kind,
                    Bounds {
                        offset: start,
                        len: self.position - start,
                    },
                );
                return Ok(());
            }
            // Backslash: skip it and the byte it escapes. The escape itself
            // is validated at materialization.
            escaped = true;
            if self.position + 2 > self.input.len() {
                return self.fail(ParseErrorKind::UnterminatedString, start);
            }
            self.position += 2;
        }
    }

    fn scan_literal(&mut self, keyword: &[u8], kind: Kind) -> Result<()> {
        let start = self.position;
        if !self.input[start..].starts_with(keyword) {
            return self.fail(ParseErrorKind::MalformedLiteral, start);
        }
        self.tape.describe_literal(kind, start);
        self.position += keyword.len();
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let start = self.position;
        if self.peek() == Some(b'-') {
            self.position += 1;
        }
        match self.peek() {
            Some(b'0') => {
                self.position += 1;
                // RFC 8259 forbids leading zeros.
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    return self.fail(ParseErrorKind::MalformedNumber, start);
                }
            }
            Some(b'1'..=b'9') => self.eat_digits(),
            _ => return self.fail(ParseErrorKind::MalformedNumber, start),
        }
        let mut kind = Kind::Integer;
        if self.peek() == Some(b'.') {
            kind = Kind::Float;
            self.position += 1;
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return self.fail(ParseErrorKind::MalformedNumber, start);
            }
            self.eat_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            kind = Kind::Float;
            self.position += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.position += 1;
            }
            if !matches!(self.peek(), Some(b'0'..=b'9')) {
                return self.fail(ParseErrorKind::MalformedNumber, start);
            }
            self.eat_digits();
        }
        self.tape.describe_scalar(
            kind,
            Bounds {
                offset: start,
                len: self.position - start,
            },
        );
        Ok(())
    }

    fn eat_digits(&mut self) {
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.position += 1;
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return self.fail(ParseErrorKind::DepthLimitExceeded, self.position);
        }
        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn next(&mut self) -> Result<u8> {
        match self.peek() {
            Some(byte) => {
                self.position += 1;
                Ok(byte)
            }
            None => self.fail(ParseErrorKind::UnexpectedEndOfInput, self.position),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.position += 1;
        }
    }

    fn fail<T>(&self, kind: ParseErrorKind, offset: usize) -> Result<T> {
        Err(Error::Parse {
            kind,
            location: Location::of(self.input, offset),
        })
    }
}
