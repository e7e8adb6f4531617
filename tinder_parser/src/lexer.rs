//! Raw tokenization phase.
//!
//! Wraps the logos-generated lexer with hand scans for the pieces logos
//! cannot express directly: string and character literals, and nesting
//! `/+ ... +/` block comments. Comments are dropped here; the
//! disambiguation phase (see [`crate::brackets`]) runs on the output.

use logos::Logos;

use crate::error::{LexWarning, ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span and source text.
#[derive(Debug, Clone, Copy)]
pub struct SpannedToken<'a> {
    pub kind: Token,
    pub text: &'a str,
    pub span: Span,
}

impl<'a> SpannedToken<'a> {
    pub fn new(kind: Token, text: &'a str, span: Span) -> Self {
        Self { kind, text, span }
    }
}

/// Output of the raw phase.
#[derive(Debug)]
pub struct Lexed<'a> {
    pub tokens: Vec<SpannedToken<'a>>,
    pub warnings: Vec<LexWarning>,
}

/// Decode the body of a string or character literal.
///
/// Recognized escapes are `\t`, `\r`, `\n`, `\\`, and the matching quote.
/// Anything else after a backslash is kept literally, and the two-character
/// sequence is reported back so the caller can warn once.
pub fn unescape(raw: &str, quote: char) -> (String, Vec<String>) {
    let mut out = String::with_capacity(raw.len());
    let mut unknown = Vec::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('\\') => out.push('\\'),
            Some(q) if q == quote => out.push(q),
            Some(other) => {
                unknown.push(format!("\\{other}"));
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    (out, unknown)
}

/// Tinder raw lexer.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    warnings: Vec<LexWarning>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            inner: Token::lexer(source),
            source_map: SourceMap::new(source),
            warnings: Vec::new(),
        }
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    fn make_span(&self, start: usize, end: usize) -> Span {
        self.source_map.span(start, end)
    }

    /// Run the raw phase to completion.
    pub fn run(mut self) -> ParseResult<Lexed<'a>> {
        let mut tokens = Vec::new();
        while let Some(result) = self.inner.next() {
            let range = self.inner.span();
            let (start, end) = (range.start, range.end);
            match result {
                Ok(Token::LineComment) => {}
                Ok(Token::BlockCommentStart) => {
                    let comment_end = self.scan_block_comment(end)?;
                    self.inner.bump(comment_end - end);
                }
                Ok(Token::DoubleQuote) => {
                    let close = self.scan_string_to_close(end, b'"')?;
                    self.inner.bump(close - end);
                    let span = self.make_span(start, close);
                    let inner = &self.source[end..close - 1];
                    self.check_escapes(inner, '"', span);
                    tokens.push(SpannedToken::new(
                        Token::StrLit,
                        &self.source[start..close],
                        span,
                    ));
                }
                Ok(Token::SingleQuote) => {
                    let close = self.scan_string_to_close(end, b'\'')?;
                    self.inner.bump(close - end);
                    let span = self.make_span(start, close);
                    let inner = &self.source[end..close - 1];
                    self.check_escapes(inner, '\'', span);
                    let (decoded, _) = unescape(inner, '\'');
                    if decoded.chars().count() != 1 {
                        return Err(ParseError::InvalidCharacter { span });
                    }
                    tokens.push(SpannedToken::new(
                        Token::CharLit,
                        &self.source[start..close],
                        span,
                    ));
                }
                Ok(kind) => {
                    let span = self.make_span(start, end);
                    tokens.push(SpannedToken::new(kind, &self.source[start..end], span));
                }
                Err(()) => {
                    let span = self.make_span(start, end);
                    tokens.push(SpannedToken::new(
                        Token::Error,
                        &self.source[start..end],
                        span,
                    ));
                }
            }
        }
        Ok(Lexed {
            tokens,
            warnings: self.warnings,
        })
    }

    fn check_escapes(&mut self, inner: &str, quote: char, span: Span) {
        let (_, unknown) = unescape(inner, quote);
        for sequence in unknown {
            self.warnings.push(LexWarning {
                message: format!("unknown escape sequence \"{sequence}\""),
                span,
            });
        }
    }

    /// Scan past a nesting block comment, returning the offset just after
    /// the final `+/`.
    fn scan_block_comment(&self, start: usize) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut depth = 1;
        let mut pos = start;

        while pos < bytes.len() && depth > 0 {
            match memchr::memchr2(b'/', b'+', &bytes[pos..]) {
                None => {
                    pos = bytes.len();
                    break;
                }
                Some(offset) => {
                    pos += offset;
                    if pos + 1 < bytes.len() {
                        if bytes[pos] == b'/' && bytes[pos + 1] == b'+' {
                            depth += 1;
                            pos += 2;
                            continue;
                        }
                        if bytes[pos] == b'+' && bytes[pos + 1] == b'/' {
                            depth -= 1;
                            pos += 2;
                            continue;
                        }
                    }
                    pos += 1;
                }
            }
        }

        if depth > 0 {
            Err(ParseError::UnterminatedBlockComment {
                span: self.make_span(start - 2, pos),
            })
        } else {
            Ok(pos)
        }
    }

    /// Scan string content, returning the offset just after the closing
    /// quote. Escaped characters are skipped, not decoded.
    fn scan_string_to_close(&self, start: usize, quote: u8) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut pos = start;

        while pos < bytes.len() {
            match memchr::memchr3(b'\\', quote, b'\n', &bytes[pos..]) {
                None => break,
                Some(offset) => {
                    pos += offset;
                    if bytes[pos] == b'\\' && pos + 1 < bytes.len() {
                        pos += 2;
                        continue;
                    }
                    if bytes[pos] == b'\n' {
                        break;
                    }
                    return Ok(pos + 1);
                }
            }
        }

        Err(ParseError::UnterminatedString {
            span: self.make_span(start - 1, pos),
        })
    }
}

/// Tokenize source text (raw phase only).
pub fn tokenize(source: &str) -> ParseResult<Lexed<'_>> {
    Lexer::new(source).run()
}
