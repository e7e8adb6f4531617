//! Literal decoding.
//!
//! The lexer hands integer literals over whole (base prefix included), so
//! the decoders here own the base logic and the out-of-range errors.

use crate::error::{ParseError, ParseResult};
use crate::lexer::unescape;
use crate::span::Span;

/// Decode an integer literal, honoring `0x`, `0o`, and `0b` prefixes.
pub fn decode_int(text: &str, span: Span) -> ParseResult<i64> {
    let invalid = || ParseError::InvalidInteger {
        literal: text.to_string(),
        span,
    };
    let lower = text.as_bytes();
    let parsed = if lower.len() > 2 && lower[0] == b'0' {
        match lower[1] {
            b'x' | b'X' => i64::from_str_radix(&text[2..], 16),
            b'o' | b'O' => i64::from_str_radix(&text[2..], 8),
            b'b' | b'B' => i64::from_str_radix(&text[2..], 2),
            _ => text.parse::<i64>(),
        }
    } else {
        text.parse::<i64>()
    };
    parsed.map_err(|_| invalid())
}

/// Decode a float literal.
pub fn decode_float(text: &str, span: Span) -> ParseResult<f64> {
    text.parse::<f64>().map_err(|_| ParseError::InvalidFloat {
        literal: text.to_string(),
        span,
    })
}

/// Decode a quoted string literal to its value.
pub fn decode_str(text: &str) -> String {
    let quote = text.chars().next().unwrap_or('"');
    let inner = &text[1..text.len().saturating_sub(1)];
    unescape(inner, quote).0
}

/// Decode a character literal to the code point of its single character.
pub fn decode_char(text: &str, span: Span) -> ParseResult<i64> {
    let inner = &text[1..text.len().saturating_sub(1)];
    let (decoded, _) = unescape(inner, '\'');
    decoded
        .chars()
        .next()
        .map(|c| c as i64)
        .ok_or(ParseError::InvalidCharacter { span })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bases() {
        let span = Span::default();
        assert_eq!(decode_int("42", span).unwrap(), 42);
        assert_eq!(decode_int("0x1F", span).unwrap(), 31);
        assert_eq!(decode_int("0o17", span).unwrap(), 15);
        assert_eq!(decode_int("0b101", span).unwrap(), 5);
    }

    #[test]
    fn test_bad_digits_are_errors() {
        let span = Span::default();
        assert!(decode_int("12ab", span).is_err());
        assert!(decode_int("0x", span).is_err());
        assert!(decode_int("0b2", span).is_err());
        // Out of range is an error, not a silent drop.
        assert!(decode_int("99999999999999999999", span).is_err());
    }

    #[test]
    fn test_decode_string() {
        assert_eq!(decode_str(r#""a\tb""#), "a\tb");
        assert_eq!(decode_str("'x'"), "x");
    }

    #[test]
    fn test_decode_char() {
        let span = Span::default();
        assert_eq!(decode_char("'a'", span).unwrap(), 97);
        assert_eq!(decode_char(r"'\n'", span).unwrap(), 10);
    }
}
