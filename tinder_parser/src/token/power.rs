//! Pratt binding powers.

use super::Token;

/// Binding-power levels, higher binds tighter. The gaps are deliberate so
/// right-associative operators can parse their right side at `power - 1`.
pub mod bp {
    pub const ASSIGN: u8 = 10;
    pub const COALESCE: u8 = 20;
    pub const LOGIC: u8 = 30;
    pub const EQUALITY: u8 = 40;
    pub const RELATIONAL: u8 = 50;
    pub const BITWISE: u8 = 60;
    pub const ADDITIVE: u8 = 70;
    pub const MULTIPLICATIVE: u8 = 80;
    pub const CAST: u8 = 90;
    pub const UNARY: u8 = 100;
    pub const POSTFIX: u8 = 110;
}

impl Token {
    /// Left binding power when this token can continue an expression.
    pub fn left_binding_power(self) -> Option<u8> {
        Some(match self {
            Token::Eq => bp::ASSIGN,
            Token::QuestionQuestion => bp::COALESCE,
            Token::KwAnd | Token::KwOr => bp::LOGIC,
            Token::EqEq | Token::NotEq => bp::EQUALITY,
            Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => bp::RELATIONAL,
            Token::LtLt | Token::GtGt | Token::Amp | Token::Pipe | Token::Caret => bp::BITWISE,
            Token::Plus | Token::Minus => bp::ADDITIVE,
            Token::Star | Token::Slash => bp::MULTIPLICATIVE,
            Token::KwAs => bp::CAST,
            Token::Dot
            | Token::QuestionDot
            | Token::Question
            | Token::LParen
            | Token::LParam
            | Token::LBracket => bp::POSTFIX,
            _ => return None,
        })
    }

    /// Only `=` is right-associative; it parses its right side at
    /// `ASSIGN - 1` so a chain nests rightward.
    pub fn is_right_associative(self) -> bool {
        self == Token::Eq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_ladder() {
        assert!(Token::Eq.left_binding_power() < Token::QuestionQuestion.left_binding_power());
        assert!(Token::KwAnd.left_binding_power() < Token::EqEq.left_binding_power());
        assert!(Token::Plus.left_binding_power() < Token::Star.left_binding_power());
        assert!(Token::Star.left_binding_power() < Token::KwAs.left_binding_power());
        assert!(Token::KwAs.left_binding_power() < Token::Dot.left_binding_power());
    }

    #[test]
    fn test_non_operators_have_no_power() {
        assert_eq!(Token::KwIf.left_binding_power(), None);
        assert_eq!(Token::Newline.left_binding_power(), None);
        assert_eq!(Token::RParen.left_binding_power(), None);
    }
}
