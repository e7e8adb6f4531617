//! Bracket disambiguation phase.
//!
//! A single pass over the raw token stream with a bracket stack. Each `<`
//! is speculatively treated as a type-parameter opener; the speculation is
//! discarded the moment any token arrives that could not appear inside a
//! type-parameter list (anything but identifiers, `.`, `,`, `<`, `>`,
//! `>>`, primitive-type keywords, and `?`). A `>` that closes a surviving
//! `<` reclassifies the pair to `LParam`/`RParam`; the first half of a
//! `>>` can do the same, in which case the token is split in two with
//! adjusted columns.
//!
//! The pass also deletes newlines inside `()` and `[]` (but not `{}`),
//! collapses consecutive newlines, removes backslash-newline pairs (line
//! continuation), and guarantees the stream ends with a `Newline` followed
//! by `EndOfFile`. Running it twice is a no-op.

use crate::lexer::SpannedToken;
use crate::span::{SourceMap, Span};
use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Open {
    Paren,
    Bracket,
    Brace,
    /// A `<` that may still turn out to be a type-parameter opener.
    Angle,
}

#[derive(Debug)]
struct Entry {
    kind: Open,
    /// Index of the opener in the output stream (used to rewrite `<`).
    out_index: usize,
}

/// Tokens that keep a speculative `<` alive.
fn allowed_in_params(kind: Token) -> bool {
    matches!(
        kind,
        Token::Identifier | Token::Dot | Token::Comma | Token::Lt | Token::Gt | Token::GtGt
            | Token::Question
    ) || kind.is_type_keyword()
}

#[derive(Debug)]
struct Disambiguator<'a> {
    out: Vec<SpannedToken<'a>>,
    stack: Vec<Entry>,
}

impl<'a> Disambiguator<'a> {
    fn discard_speculative(&mut self) {
        while matches!(self.stack.last(), Some(e) if e.kind == Open::Angle) {
            self.stack.pop();
        }
    }

    fn open(&mut self, kind: Open, tok: SpannedToken<'a>) {
        self.discard_speculative();
        self.stack.push(Entry {
            kind,
            out_index: self.out.len(),
        });
        self.out.push(tok);
    }

    fn close(&mut self, kind: Open, tok: SpannedToken<'a>) {
        self.discard_speculative();
        if matches!(self.stack.last(), Some(e) if e.kind == kind) {
            self.stack.pop();
        }
        self.out.push(tok);
    }

    /// Handle a single `>` half: closes a surviving `<` as `RParam`,
    /// otherwise stays an ordinary `>`.
    fn close_angle(&mut self, tok: SpannedToken<'a>) {
        if matches!(self.stack.last(), Some(e) if e.kind == Open::Angle) {
            let entry = self.stack.pop().unwrap();
            self.out[entry.out_index].kind = Token::LParam;
            self.out.push(SpannedToken::new(Token::RParam, tok.text, tok.span));
        } else {
            self.out.push(tok);
        }
    }

    fn newline(&mut self, tok: SpannedToken<'a>) {
        self.discard_speculative();
        if matches!(
            self.stack.last(),
            Some(e) if e.kind == Open::Paren || e.kind == Open::Bracket
        ) {
            return;
        }
        if matches!(self.out.last(), Some(t) if t.kind == Token::Newline) {
            return;
        }
        self.out.push(tok);
    }

    fn push(&mut self, tok: SpannedToken<'a>) {
        match tok.kind {
            Token::Newline => self.newline(tok),
            Token::Lt => {
                self.stack.push(Entry {
                    kind: Open::Angle,
                    out_index: self.out.len(),
                });
                self.out.push(tok);
            }
            Token::Gt => self.close_angle(tok),
            Token::GtGt => {
                if matches!(self.stack.last(), Some(e) if e.kind == Open::Angle) {
                    let first = SpannedToken::new(
                        Token::Gt,
                        &tok.text[0..1],
                        Span::new(tok.span.start, tok.span.start + 1, tok.span.line, tok.span.column),
                    );
                    let second = SpannedToken::new(
                        Token::Gt,
                        &tok.text[1..2],
                        Span::new(tok.span.start + 1, tok.span.end, tok.span.line, tok.span.column + 1),
                    );
                    self.close_angle(first);
                    self.close_angle(second);
                } else {
                    self.out.push(tok);
                }
            }
            Token::LParen => self.open(Open::Paren, tok),
            Token::RParen => self.close(Open::Paren, tok),
            Token::LBracket => self.open(Open::Bracket, tok),
            Token::RBracket => self.close(Open::Bracket, tok),
            Token::LBrace => self.open(Open::Brace, tok),
            Token::RBrace => self.close(Open::Brace, tok),
            kind if allowed_in_params(kind) => self.out.push(tok),
            _ => {
                self.discard_speculative();
                self.out.push(tok);
            }
        }
    }
}

/// Run the disambiguation phase.
pub fn disambiguate<'a>(tokens: Vec<SpannedToken<'a>>, map: &SourceMap) -> Vec<SpannedToken<'a>> {
    let mut d = Disambiguator {
        out: Vec::with_capacity(tokens.len() + 2),
        stack: Vec::new(),
    };

    let mut iter = tokens.into_iter().peekable();
    while let Some(tok) = iter.next() {
        // The tail is regenerated below, so a second run stays a no-op.
        if tok.kind == Token::EndOfFile {
            continue;
        }
        // Line continuation: a backslash directly before a newline removes both.
        if tok.kind == Token::Backslash
            && matches!(iter.peek(), Some(next) if next.kind == Token::Newline)
        {
            d.discard_speculative();
            iter.next();
            continue;
        }
        d.push(tok);
    }

    if !matches!(d.out.last(), Some(t) if t.kind == Token::Newline) {
        d.out.push(SpannedToken::new(Token::Newline, "", map.eof_span()));
    }
    d.out.push(SpannedToken::new(Token::EndOfFile, "", map.eof_span()));
    d.out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn run(source: &str) -> Vec<Token> {
        let lexed = tokenize(source).unwrap();
        let map = SourceMap::new(source);
        disambiguate(lexed.tokens, &map).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_confirmed_params() {
        assert_eq!(
            run("list<int>"),
            vec![
                Token::KwList,
                Token::LParam,
                Token::KwInt,
                Token::RParam,
                Token::Newline,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_comparison_stays_comparison() {
        assert_eq!(
            run("a < b and c"),
            vec![
                Token::Identifier,
                Token::Lt,
                Token::Identifier,
                Token::KwAnd,
                Token::Identifier,
                Token::Newline,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_double_close_splits() {
        assert_eq!(
            run("list<list<int>>"),
            vec![
                Token::KwList,
                Token::LParam,
                Token::KwList,
                Token::LParam,
                Token::KwInt,
                Token::RParam,
                Token::RParam,
                Token::Newline,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_split_columns_adjusted() {
        let source = "list<list<int>>";
        let lexed = tokenize(source).unwrap();
        let map = SourceMap::new(source);
        let out = disambiguate(lexed.tokens, &map);
        let rparams: Vec<_> = out.iter().filter(|t| t.kind == Token::RParam).collect();
        assert_eq!(rparams.len(), 2);
        assert_eq!(rparams[0].span.column + 1, rparams[1].span.column);
    }

    #[test]
    fn test_newlines_removed_in_parens_kept_in_braces() {
        assert_eq!(
            run("f(\na\n)"),
            vec![
                Token::Identifier,
                Token::LParen,
                Token::Identifier,
                Token::RParen,
                Token::Newline,
                Token::EndOfFile,
            ]
        );
        let braced = run("{\na\n}");
        assert!(braced.contains(&Token::Newline));
        assert_eq!(braced.iter().filter(|k| **k == Token::Newline).count(), 3);
    }

    #[test]
    fn test_line_continuation() {
        assert_eq!(
            run("a \\\nb"),
            vec![
                Token::Identifier,
                Token::Identifier,
                Token::Newline,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_consecutive_newlines_collapse() {
        assert_eq!(
            run("a\n\n\nb"),
            vec![
                Token::Identifier,
                Token::Newline,
                Token::Identifier,
                Token::Newline,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_idempotent() {
        let source = "void f(list<int> xs) {\n  a < b\n}";
        let lexed = tokenize(source).unwrap();
        let map = SourceMap::new(source);
        let once = disambiguate(lexed.tokens, &map);
        let kinds: Vec<_> = once.iter().map(|t| t.kind).collect();
        let twice = disambiguate(once, &map);
        let kinds2: Vec<_> = twice.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, kinds2);
    }
}
