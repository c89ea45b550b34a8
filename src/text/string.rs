//! JSON string escaping and unescaping.

use memchr::memchr;

use crate::error::DecodeError;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Converts a text string to its JSON-escaped byte form in a single forward
/// pass, copying literal runs and substituting escape sequences. Returns
/// whether any substitution occurred so callers can tag the entry `string`
/// when the bytes can later be decoded without an unescape pass.
///
/// `\n`, `\r`, `\t`, `"`, and `\` take their two-byte forms; any other
/// control byte below 0x20 becomes `\u00XX` so the output is always a valid
/// JSON string body. Bytes >= 0x80 pass through untouched (the input is
/// already valid UTF-8).
pub fn escape(value: &str) -> (bool, Vec<u8>) {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut start = 0;
    for (idx, &byte) in bytes.iter().enumerate() {
        let short: Option<&[u8]> = match byte {
            b'\n' => Some(b"\\n"),
            b'\r' => Some(b"\\r"),
            b'\t' => Some(b"\\t"),
            b'"' => Some(b"\\\""),
            b'\\' => Some(b"\\\\"),
            0x00..=0x1f => None,
            _ => continue,
        };
        out.extend_from_slice(&bytes[start..idx]);
        match short {
            Some(seq) => out.extend_from_slice(seq),
            None => {
                out.extend_from_slice(b"\\u00");
                out.push(HEX[(byte >> 4) as usize]);
                out.push(HEX[(byte & 0x0f) as usize]);
            }
        }
        start = idx + 1;
    }
    if start == 0 {
        return (false, bytes.to_vec());
    }
    out.extend_from_slice(&bytes[start..]);
    (true, out)
}

/// Inverse of [`escape`]: decodes a JSON string body (the bytes between the
/// quotes) back to text, handling the full RFC 8259 escape set including
/// `\uXXXX` with surrogate pairs, and validating UTF-8 afterwards.
pub fn unescape(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut rest = bytes;
    while let Some(pos) = memchr(b'\\', rest) {
        out.extend_from_slice(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let (&code, tail) = tail.split_first().ok_or(DecodeError::UnterminatedEscape)?;
        rest = match code {
            b'"' => {
                out.push(b'"');
                tail
            }
            b'\\' => {
                out.push(b'\\');
                tail
            }
            b'/' => {
                out.push(b'/');
                tail
            }
            b'b' => {
                out.push(0x08);
                tail
            }
            b'f' => {
                out.push(0x0c);
                tail
            }
            b'n' => {
                out.push(b'\n');
                tail
            }
            b'r' => {
                out.push(b'\r');
                tail
            }
            b't' => {
                out.push(b'\t');
                tail
            }
            b'u' => {
                let (ch, tail) = decode_unicode_escape(tail)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                tail
            }
            other => return Err(DecodeError::InvalidEscape(other as char)),
        };
    }
    out.extend_from_slice(rest);
    String::from_utf8(out).map_err(|_| DecodeError::InvalidUtf8)
}

fn decode_unicode_escape(tail: &[u8]) -> Result<(char, &[u8]), DecodeError> {
    let (code, tail) = hex4(tail)?;
    if (0xDC00..0xE000).contains(&code) {
        return Err(DecodeError::UnpairedSurrogate(code));
    }
    if (0xD800..0xDC00).contains(&code) {
        // A high surrogate is only valid directly followed by a low one.
        let rest = tail
            .strip_prefix(b"\\u")
            .ok_or(DecodeError::UnpairedSurrogate(code))?;
        let (low, rest) = hex4(rest)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(DecodeError::UnpairedSurrogate(code));
        }
        let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
        return char::from_u32(combined)
            .map(|ch| (ch, rest))
            .ok_or(DecodeError::InvalidUnicodeEscape(combined));
    }
    char::from_u32(code)
        .map(|ch| (ch, tail))
        .ok_or(DecodeError::InvalidUnicodeEscape(code))
}

fn hex4(bytes: &[u8]) -> Result<(u32, &[u8]), DecodeError> {
    if bytes.len() < 4 {
        return Err(DecodeError::UnterminatedEscape);
    }
    let mut acc = 0u32;
    for &byte in &bytes[..4] {
        let digit = (byte as char)
            .to_digit(16)
            .ok_or(DecodeError::InvalidEscape(byte as char))?;
        acc = (acc << 4) | digit;
    }
    Ok((acc, &bytes[4..]))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("plain", false, "plain")]
    #[case("", false, "")]
    #[case("line\nbreak", true, "line\\nbreak")]
    #[case("a\r\t", true, "a\\r\\t")]
    #[case("say \"hi\"", true, "say \\\"hi\\\"")]
    #[case("back\\slash", true, "back\\\\slash")]
    #[case("bell\u{7}", true, "bell\\u0007")]
    #[case("caf\u{e9}", false, "caf\u{e9}")]
    fn escape_cases(#[case] input: &str, #[case] expect_escaped: bool, #[case] expect: &str) {
        let (escaped, bytes) = escape(input);
        assert_eq!(escaped, expect_escaped);
        assert_eq!(bytes, expect.as_bytes());
    }

    #[rstest]
    #[case("\n \r \t \" \\")]
    #[case("unicode \u{1F600} mixed")]
    #[case("controls \u{1} \u{1f}")]
    #[case("")]
    fn escape_round_trips(#[case] input: &str) {
        let (_, bytes) = escape(input);
        assert_eq!(unescape(&bytes).unwrap(), input);
    }

    #[rstest]
    #[case(b"solidus \\/ ok", "solidus / ok")]
    #[case(b"\\b\\f", "\u{8}\u{c}")]
    #[case(b"\\u0041", "A")]
    #[case(b"\\uD83D\\uDE00", "\u{1F600}")]
    fn unescape_full_escape_set(#[case] input: &[u8], #[case] expect: &str) {
        assert_eq!(unescape(input).unwrap(), expect);
    }

    #[rstest]
    #[case(b"bad \\q" as &[u8], DecodeError::InvalidEscape('q'))]
    #[case(b"bad \\", DecodeError::UnterminatedEscape)]
    #[case(b"\\u12", DecodeError::UnterminatedEscape)]
    #[case(b"\\uZZZZ", DecodeError::InvalidEscape('Z'))]
    #[case(b"\\uD800 alone", DecodeError::UnpairedSurrogate(0xD800))]
    #[case(b"\\uD800\\u0041", DecodeError::UnpairedSurrogate(0xD800))]
    #[case(b"\\uDC00", DecodeError::UnpairedSurrogate(0xDC00))]
    fn unescape_rejects_invalid_sequences(#[case] input: &[u8], #[case] expect: DecodeError) {
        assert_eq!(unescape(input).unwrap_err(), expect);
    }

    #[test]
    fn unescape_rejects_invalid_utf8() {
        assert_eq!(unescape(&[0xff, 0xfe]).unwrap_err(), DecodeError::InvalidUtf8);
    }
}
