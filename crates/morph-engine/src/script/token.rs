//! Tokens of the class source language.

#![allow(missing_docs)]

use crate::descriptor::PrimitiveKind;
use std::fmt;

/// A lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Import,
    Class,
    Extends,
    Implements,
    Public,
    Protected,
    Private,
    Static,
    Final,
    Void,
    Return,
    If,
    Else,
    While,
    Throw,
    Throws,
    This,
    Super,
    True,
    False,
    Null,
    /// `boolean`, `int`, ...
    Primitive(PrimitiveKind),

    // Literals
    /// Decimal int literal; may be 2147483648 when negated
    IntLiteral(i64),
    LongLiteral(i64),
    FloatLiteral(f32),
    DoubleLiteral(f64),
    CharLiteral(char),
    StringLiteral(String),
    Identifier(String),

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,
    Dot,

    // Assignment
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,

    // Operators
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    AmpAmp,
    PipePipe,
    Question,
    Colon,

    Eof,
}

impl Token {
    /// Whether the token is a member or class modifier.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Token::Public | Token::Protected | Token::Private | Token::Static | Token::Final
        )
    }

    /// Whether the token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::IntLiteral(_)
                | Token::LongLiteral(_)
                | Token::FloatLiteral(_)
                | Token::DoubleLiteral(_)
                | Token::CharLiteral(_)
                | Token::StringLiteral(_)
                | Token::True
                | Token::False
                | Token::Null
        )
    }
}

/// Source location of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Span covering `self` through `other`.
    pub fn to(&self, other: &Span) -> Span {
        Span {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
            column: self.column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Import => write!(f, "import"),
            Token::Class => write!(f, "class"),
            Token::Extends => write!(f, "extends"),
            Token::Implements => write!(f, "implements"),
            Token::Public => write!(f, "public"),
            Token::Protected => write!(f, "protected"),
            Token::Private => write!(f, "private"),
            Token::Static => write!(f, "static"),
            Token::Final => write!(f, "final"),
            Token::Void => write!(f, "void"),
            Token::Return => write!(f, "return"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::Throw => write!(f, "throw"),
            Token::Throws => write!(f, "throws"),
            Token::This => write!(f, "this"),
            Token::Super => write!(f, "super"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Null => write!(f, "null"),
            Token::Primitive(kind) => write!(f, "{}", kind),
            Token::IntLiteral(n) => write!(f, "{}", n),
            Token::LongLiteral(n) => write!(f, "{}L", n),
            Token::FloatLiteral(n) => write!(f, "{}f", n),
            Token::DoubleLiteral(n) => write!(f, "{}", n),
            Token::CharLiteral(c) => write!(f, "'{}'", c.escape_default()),
            Token::StringLiteral(s) => write!(f, "\"{}\"", s.escape_default()),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::LeftBrace => write!(f, "{{"),
            Token::RightBrace => write!(f, "}}"),
            Token::LeftBracket => write!(f, "["),
            Token::RightBracket => write!(f, "]"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Equal => write!(f, "="),
            Token::PlusEqual => write!(f, "+="),
            Token::MinusEqual => write!(f, "-="),
            Token::StarEqual => write!(f, "*="),
            Token::SlashEqual => write!(f, "/="),
            Token::PercentEqual => write!(f, "%="),
            Token::EqualEqual => write!(f, "=="),
            Token::BangEqual => write!(f, "!="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::AmpAmp => write!(f, "&&"),
            Token::PipePipe => write!(f, "||"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Eof => write!(f, "end of file"),
        }
    }
}
