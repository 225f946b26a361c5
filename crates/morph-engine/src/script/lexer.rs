//! Lexer for the class source language.
//!
//! Uses logos for raw tokenization, then converts raw tokens (decoding
//! literals and escapes) into [`Token`]s with line/column spans.

use super::token::{Span, Token};
use crate::descriptor::PrimitiveKind;
use logos::Logos;

/// Logos-based raw token enum.
///
/// Literal variants carry no payload; their text is decoded from the source
/// slice when converting to [`Token`].
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n\f]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    /// Emitted only when the comment never closes; closed comments are skipped.
    #[token("/*", block_comment)]
    UnterminatedComment,

    #[token("import")]
    Import,
    #[token("class")]
    Class,
    #[token("extends")]
    Extends,
    #[token("implements")]
    Implements,
    #[token("public")]
    Public,
    #[token("protected")]
    Protected,
    #[token("private")]
    Private,
    #[token("static")]
    Static,
    #[token("final")]
    Final,
    #[token("void")]
    Void,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("throw")]
    Throw,
    #[token("throws")]
    Throws,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[token("boolean")]
    Boolean,
    #[token("byte")]
    Byte,
    #[token("short")]
    Short,
    #[token("char")]
    Char,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,

    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r"[0-9]+[lL]")]
    LongLiteral,
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?[fF]")]
    FloatLiteral,
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[dD]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[dD]?")]
    #[regex(r"[0-9]+[dD]")]
    DoubleLiteral,
    #[regex(r"'([^'\\\n]|\\.)*'")]
    CharLiteral,
    #[regex(r#""([^"\\\n]|\\.)*""#)]
    StringLiteral,
    #[regex(r#""([^"\\\n]|\\.)*"#)]
    UnterminatedString,
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    #[token("=")]
    Equal,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("%=")]
    PercentEqual,

    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
}

/// Skip past the closing `*/` of a block comment, or swallow the rest of
/// the source when there is none.
fn block_comment(lex: &mut logos::Lexer<'_, LogosToken>) -> logos::Filter<()> {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            logos::Filter::Skip
        }
        None => {
            lex.bump(lex.remainder().len());
            logos::Filter::Emit(())
        }
    }
}

/// Lexer error types.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    UnterminatedComment { span: Span },
    InvalidNumber { text: String, span: Span },
    InvalidEscape { escape: String, span: Span },
    InvalidCharLiteral { text: String, span: Span },
}

/// Lexer for class source text.
pub struct Lexer<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    /// A lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Tokenize the whole source. The result always ends with [`Token::Eof`].
    pub fn tokenize(self) -> Result<Vec<(Token, Span)>, Vec<LexError>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut lexer = LogosToken::lexer(self.source);

        while let Some(result) = lexer.next() {
            let range = lexer.span();
            let span = self.span(range.start, range.end);
            match result {
                Ok(raw) => match self.convert_token(raw, span) {
                    Ok(token) => tokens.push((token, span)),
                    Err(err) => errors.push(err),
                },
                Err(()) => {
                    let char = self.source[range.start..].chars().next().unwrap_or('\0');
                    errors.push(LexError::UnexpectedCharacter { char, span });
                }
            }
        }

        let end = self.source.len();
        tokens.push((Token::Eof, self.span(end, end)));

        if errors.is_empty() {
            Ok(tokens)
        } else {
            Err(errors)
        }
    }

    fn span(&self, start: usize, end: usize) -> Span {
        let line = match self.line_starts.binary_search(&start) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.source[line_start..start].chars().count() + 1;
        Span::new(start, end, line as u32 + 1, column as u32)
    }

    fn convert_token(&self, raw: LogosToken, span: Span) -> Result<Token, LexError> {
        let text = span.slice(self.source);
        let token = match raw {
            LogosToken::Import => Token::Import,
            LogosToken::Class => Token::Class,
            LogosToken::Extends => Token::Extends,
            LogosToken::Implements => Token::Implements,
            LogosToken::Public => Token::Public,
            LogosToken::Protected => Token::Protected,
            LogosToken::Private => Token::Private,
            LogosToken::Static => Token::Static,
            LogosToken::Final => Token::Final,
            LogosToken::Void => Token::Void,
            LogosToken::Return => Token::Return,
            LogosToken::If => Token::If,
            LogosToken::Else => Token::Else,
            LogosToken::While => Token::While,
            LogosToken::Throw => Token::Throw,
            LogosToken::Throws => Token::Throws,
            LogosToken::This => Token::This,
            LogosToken::Super => Token::Super,
            LogosToken::True => Token::True,
            LogosToken::False => Token::False,
            LogosToken::Null => Token::Null,

            LogosToken::Boolean => Token::Primitive(PrimitiveKind::Boolean),
            LogosToken::Byte => Token::Primitive(PrimitiveKind::Byte),
            LogosToken::Short => Token::Primitive(PrimitiveKind::Short),
            LogosToken::Char => Token::Primitive(PrimitiveKind::Char),
            LogosToken::Int => Token::Primitive(PrimitiveKind::Int),
            LogosToken::Long => Token::Primitive(PrimitiveKind::Long),
            LogosToken::Float => Token::Primitive(PrimitiveKind::Float),
            LogosToken::Double => Token::Primitive(PrimitiveKind::Double),

            LogosToken::IntLiteral => {
                // 2147483648 is only legal as the operand of unary minus,
                // which the parser checks
                match text.parse::<i64>() {
                    Ok(n) if n <= i64::from(i32::MAX) + 1 => Token::IntLiteral(n),
                    _ => return Err(invalid_number(text, span)),
                }
            }
            LogosToken::LongLiteral => text[..text.len() - 1]
                .parse::<i64>()
                .map(Token::LongLiteral)
                .map_err(|_| invalid_number(text, span))?,
            LogosToken::FloatLiteral => text[..text.len() - 1]
                .parse::<f32>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Token::FloatLiteral)
                .ok_or_else(|| invalid_number(text, span))?,
            LogosToken::DoubleLiteral => text
                .trim_end_matches(['d', 'D'])
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Token::DoubleLiteral)
                .ok_or_else(|| invalid_number(text, span))?,
            LogosToken::CharLiteral => {
                let decoded = unescape(&text[1..text.len() - 1], span)?;
                let mut chars = decoded.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Token::CharLiteral(c),
                    _ => {
                        return Err(LexError::InvalidCharLiteral {
                            text: text.to_string(),
                            span,
                        })
                    }
                }
            }
            LogosToken::StringLiteral => {
                Token::StringLiteral(unescape(&text[1..text.len() - 1], span)?)
            }
            LogosToken::UnterminatedString => return Err(LexError::UnterminatedString { span }),
            LogosToken::UnterminatedComment => return Err(LexError::UnterminatedComment { span }),
            LogosToken::Identifier => Token::Identifier(text.to_string()),

            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
            LogosToken::Semicolon => Token::Semicolon,
            LogosToken::Comma => Token::Comma,
            LogosToken::Dot => Token::Dot,
            LogosToken::Equal => Token::Equal,
            LogosToken::PlusEqual => Token::PlusEqual,
            LogosToken::MinusEqual => Token::MinusEqual,
            LogosToken::StarEqual => Token::StarEqual,
            LogosToken::SlashEqual => Token::SlashEqual,
            LogosToken::PercentEqual => Token::PercentEqual,
            LogosToken::EqualEqual => Token::EqualEqual,
            LogosToken::BangEqual => Token::BangEqual,
            LogosToken::Less => Token::Less,
            LogosToken::LessEqual => Token::LessEqual,
            LogosToken::Greater => Token::Greater,
            LogosToken::GreaterEqual => Token::GreaterEqual,
            LogosToken::Plus => Token::Plus,
            LogosToken::Minus => Token::Minus,
            LogosToken::Star => Token::Star,
            LogosToken::Slash => Token::Slash,
            LogosToken::Percent => Token::Percent,
            LogosToken::Bang => Token::Bang,
            LogosToken::AmpAmp => Token::AmpAmp,
            LogosToken::PipePipe => Token::PipePipe,
            LogosToken::Question => Token::Question,
            LogosToken::Colon => Token::Colon,

            // skipped by logos
            LogosToken::Whitespace | LogosToken::LineComment => {
                unreachable!("skipped tokens are never produced")
            }
        };
        Ok(token)
    }
}

fn invalid_number(text: &str, span: Span) -> LexError {
    LexError::InvalidNumber {
        text: text.to_string(),
        span,
    }
}

/// Decode escape sequences in a string or char literal body.
fn unescape(body: &str, span: Span) -> Result<String, LexError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escape = chars.next().unwrap_or('\\');
        let decoded = match escape {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16).ok().filter(|_| hex.len() == 4);
                match code.and_then(char::from_u32) {
                    Some(c) => c,
                    None => {
                        return Err(LexError::InvalidEscape {
                            escape: format!("\\u{}", hex),
                            span,
                        })
                    }
                }
            }
            other => {
                return Err(LexError::InvalidEscape {
                    escape: format!("\\{}", other),
                    span,
                })
            }
        };
        out.push(decoded);
    }
    Ok(out)
}

impl LexError {
    /// Get the span of this error
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. }
            | LexError::InvalidEscape { span, .. }
            | LexError::InvalidCharLiteral { span, .. } => span,
        }
    }

    /// Get a description of this error
    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedComment { .. } => "Unterminated block comment".to_string(),
            LexError::InvalidNumber { text, .. } => format!("Invalid number '{}'", text),
            LexError::InvalidEscape { escape, .. } => {
                format!("Invalid escape sequence '{}'", escape)
            }
            LexError::InvalidCharLiteral { text, .. } => {
                format!("Invalid character literal {}", text)
            }
        }
    }

    /// Get a hint for fixing this error
    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote to terminate the string".to_string())
            }
            LexError::UnterminatedComment { .. } => {
                Some("Close the comment with */".to_string())
            }
            LexError::InvalidEscape { .. } => Some(
                "Valid escape sequences are: \\n \\t \\r \\b \\f \\0 \\\\ \\\" \\' \\uXXXX"
                    .to_string(),
            ),
            LexError::InvalidNumber { .. } => {
                Some("int literals must fit in 32 bits; add an L suffix for long".to_string())
            }
            LexError::InvalidCharLiteral { .. } => {
                Some("A character literal holds exactly one character".to_string())
            }
            LexError::UnexpectedCharacter { .. } => None,
        }
    }

    /// Format the error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        );

        if let Some(error_line) = source.lines().nth(span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}
