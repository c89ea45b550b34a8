use std::fmt;

use thiserror::Error;

/// Byte offset plus the 1-based line and column it falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub(crate) fn of(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let mut line = 1;
        let mut column = 1;
        for &byte in &input[..offset] {
            if byte == b'\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// What went wrong while scanning input bytes into a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("expected array or object at top level")]
    ExpectedContainer,
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("malformed literal")]
    MalformedLiteral,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("control character in string")]
    ControlCharacterInString,
    #[error("malformed number")]
    MalformedNumber,
    #[error("trailing characters after document")]
    TrailingCharacters,
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("maximum nesting depth exceeded")]
    DepthLimitExceeded,
}

/// Decoding failures surfaced lazily, at the point a value is materialized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("unterminated escape sequence")]
    UnterminatedEscape,
    #[error("invalid escape character '{0}'")]
    InvalidEscape(char),
    #[error("invalid unicode escape \\u{0:04X}")]
    InvalidUnicodeEscape(u32),
    #[error("unpaired surrogate \\u{0:04X}")]
    UnpairedSurrogate(u32),
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("parse error at {location}: {kind}")]
    Parse {
        kind: ParseErrorKind,
        location: Location,
    },
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_tracks_lines_and_columns() {
        let input = b"[1,\n 2,\n 3]";
        assert_eq!(
            Location::of(input, 0),
            Location {
                offset: 0,
                line: 1,
                column: 1
            }
        );
        assert_eq!(
            Location::of(input, 5),
            Location {
                offset: 5,
                line: 2,
                column: 2
            }
        );
        assert_eq!(Location::of(input, 9).line, 3);
    }

    #[test]
    fn location_clamps_to_input_length() {
        let loc = Location::of(b"[]", 10);
        assert_eq!(loc.offset, 2);
    }

    #[test]
    fn errors_render_with_context() {
        let err = Error::Parse {
            kind: ParseErrorKind::UnterminatedString,
            location: Location {
                offset: 4,
                line: 1,
                column: 5,
            },
        };
        assert_eq!(err.to_string(), "parse error at 1:5: unterminated string");
    }
}
