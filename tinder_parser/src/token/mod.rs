//! Token definitions for the Tinder lexer.

mod power;

pub use power::bp;

use logos::Logos;
use serde::{Deserialize, Serialize};

/// Tinder tokens.
///
/// The raw phase produces everything except `LParam`/`RParam`, which the
/// bracket-disambiguation phase rewrites from confirmed `<`/`>` pairs, and
/// `EndOfFile`, which is appended at the end of the stream.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[logos(skip r"[ \t\f]+")]
pub enum Token {
    // ==================== Keywords ====================
    #[token("if")]
    KwIf,
    #[token("else")]
    KwElse,
    #[token("while")]
    KwWhile,
    #[token("class")]
    KwClass,
    #[token("return")]
    KwReturn,
    #[token("and")]
    KwAnd,
    #[token("or")]
    KwOr,
    #[token("not")]
    KwNot,
    #[token("as")]
    KwAs,
    #[token("external")]
    KwExternal,
    #[token("static")]
    KwStatic,
    #[token("var")]
    KwVar,
    #[token("bool")]
    KwBool,
    #[token("int")]
    KwInt,
    #[token("float")]
    KwFloat,
    #[token("string")]
    KwString,
    #[token("list")]
    KwList,
    #[token("function")]
    KwFunction,
    #[token("void")]
    KwVoid,
    #[token("this")]
    KwThis,
    #[token("null")]
    KwNull,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ==================== Punctuation ====================
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("?.")]
    QuestionDot,
    #[token("?")]
    Question,
    #[token("??")]
    QuestionQuestion,
    #[token("\\")]
    Backslash,

    // ==================== Operators ====================
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,

    // ==================== Literals ====================
    /// A digit followed by any run of digits and letters, so base prefixes
    /// (`0x1F`, `0o17`, `0b101`) arrive as a single token the parser decodes.
    #[regex(r"[0-9][0-9a-zA-Z]*", priority = 2)]
    IntLit,
    /// Reclassified integer: digits, a dot, then more digits/letters.
    #[regex(r"[0-9][0-9a-zA-Z]*\.[0-9][0-9a-zA-Z]*", priority = 3)]
    FloatLit,

    /// Opening `"` (string content is scanned by hand, see the lexer)
    #[token("\"")]
    DoubleQuote,
    /// Opening `'` (character content is scanned by hand, see the lexer)
    #[token("'")]
    SingleQuote,

    // ==================== Identifiers ====================
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Identifier,

    // ==================== Comments ====================
    #[regex(r"//[^\n]*")]
    LineComment,
    /// Opening `/+` (nesting body scanned by hand, see the lexer)
    #[token("/+")]
    BlockCommentStart,

    // ==================== Whitespace ====================
    /// A whitespace run containing at least one newline.
    #[regex(r"(\r\n|\n|\r)[ \t\f\r\n]*")]
    Newline,

    // ==================== Synthesized kinds ====================
    /// Decoded string literal (produced by the lexer's string scan)
    StrLit,
    /// Decoded character literal (produced by the lexer's string scan)
    CharLit,
    /// `<` confirmed as a type-parameter opener
    LParam,
    /// `>` confirmed as a type-parameter closer
    RParam,
    /// End of the token stream
    EndOfFile,
    /// Placeholder for unrecognized input
    Error,
}

impl Token {
    /// Keywords naming a built-in type, which keep a speculative `<` alive
    /// during bracket disambiguation.
    pub fn is_type_keyword(self) -> bool {
        matches!(
            self,
            Token::KwVoid
                | Token::KwBool
                | Token::KwInt
                | Token::KwFloat
                | Token::KwString
                | Token::KwList
                | Token::KwFunction
        )
    }

    /// Human-readable description for diagnostics.
    pub fn describe(self, text: &str) -> String {
        match self {
            Token::Identifier => format!("identifier \"{text}\""),
            Token::IntLit | Token::FloatLit => format!("literal \"{text}\""),
            Token::StrLit | Token::CharLit => "string literal".to_string(),
            Token::Newline => "end of line".to_string(),
            Token::EndOfFile => "end of input".to_string(),
            _ => format!("\"{}\"", text.trim_end()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn kinds(source: &str) -> Vec<Token> {
        Token::lexer(source)
            .map(|r| r.unwrap_or(Token::Error))
            .collect()
    }

    #[test]
    fn test_keywords_and_idents() {
        assert_eq!(
            kinds("if ifx x_1"),
            vec![Token::KwIf, Token::Identifier, Token::Identifier]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(kinds("12 0x1F 1.5"), vec![Token::IntLit, Token::IntLit, Token::FloatLit]);
        // A dot not followed by a digit stays member access.
        assert_eq!(kinds("1.x"), vec![Token::IntLit, Token::Dot, Token::Identifier]);
    }

    #[test]
    fn test_null_operators() {
        assert_eq!(
            kinds("?. ?? ?"),
            vec![Token::QuestionDot, Token::QuestionQuestion, Token::Question]
        );
    }

    #[test]
    fn test_newline_run_is_one_token() {
        assert_eq!(kinds("a\n  \n\tb"), vec![Token::Identifier, Token::Newline, Token::Identifier]);
    }

    #[test]
    fn test_shift_operators() {
        assert_eq!(kinds("<< >> < >"), vec![Token::LtLt, Token::GtGt, Token::Lt, Token::Gt]);
    }
}
