//! Operator precedence table for expression parsing.

#![allow(missing_docs)]

use crate::script::token::Token;
use crate::script::unit::BinaryOp;

/// Operator precedence level (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    LogicalOr = 1,      // ||
    LogicalAnd = 2,     // &&
    Equality = 3,       // ==, !=
    Relational = 4,     // <, <=, >, >=
    Additive = 5,       // +, -
    Multiplicative = 6, // *, /, %
}

/// Get the precedence of a binary operator token.
pub fn get_precedence(token: &Token) -> Precedence {
    match token {
        Token::PipePipe => Precedence::LogicalOr,
        Token::AmpAmp => Precedence::LogicalAnd,
        Token::EqualEqual | Token::BangEqual => Precedence::Equality,
        Token::Less | Token::LessEqual | Token::Greater | Token::GreaterEqual => {
            Precedence::Relational
        }
        Token::Plus | Token::Minus => Precedence::Additive,
        Token::Star | Token::Slash | Token::Percent => Precedence::Multiplicative,
        _ => Precedence::None,
    }
}

/// Arithmetic or comparison operator for a token (not `&&`/`||`).
pub fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        Token::EqualEqual => BinaryOp::Eq,
        Token::BangEqual => BinaryOp::Ne,
        Token::Less => BinaryOp::Lt,
        Token::LessEqual => BinaryOp::Le,
        Token::Greater => BinaryOp::Gt,
        Token::GreaterEqual => BinaryOp::Ge,
        _ => return None,
    };
    Some(op)
}

/// Arithmetic operator of a compound assignment token.
pub fn compound_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::PlusEqual => BinaryOp::Add,
        Token::MinusEqual => BinaryOp::Sub,
        Token::StarEqual => BinaryOp::Mul,
        Token::SlashEqual => BinaryOp::Div,
        Token::PercentEqual => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}
