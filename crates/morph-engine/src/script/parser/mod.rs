//! Recursive descent parser for the class source language.
//!
//! Transforms the token stream from the lexer into a [`CompilationUnit`].
//! Errors inside a member are recorded and parsing resumes at the next
//! member, so one pass reports as many problems as possible.

pub mod decl;
pub mod error;
pub mod expr;
pub mod precedence;
pub mod stmt;

use super::ast::*;
use super::lexer::{LexError, Lexer};
use super::token::{Span, Token};

pub use error::{ParseError, ParseErrorKind};

/// Parser state.
pub struct Parser {
    /// Pre-tokenized input, always ending with `Eof`
    tokens: Vec<(Token, Span)>,

    /// Current position in token stream
    pos: usize,

    /// Accumulated parse errors
    errors: Vec<ParseError>,
}

impl Parser {
    /// Create a new parser from source code.
    pub fn new(source: &str) -> Result<Self, Vec<LexError>> {
        let tokens = Lexer::new(source).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        })
    }

    /// Parse the whole unit.
    pub fn parse(mut self) -> Result<CompilationUnit, Vec<ParseError>> {
        let mut imports = Vec::new();
        while self.check(&Token::Import) {
            match decl::parse_import(&mut self) {
                Ok(import) => imports.push(import),
                Err(err) => {
                    self.errors.push(err);
                    decl::sync_to_member_boundary(&mut self);
                }
            }
        }

        let class = match decl::parse_class(&mut self) {
            Ok(class) => Some(class),
            Err(err) => {
                self.errors.push(err);
                None
            }
        };

        if class.is_some() && !self.at_eof() {
            let err = ParseError::invalid_syntax(
                "only one class may be declared per unit",
                self.current_span(),
            );
            self.errors.push(err);
        }

        match class {
            Some(class) if self.errors.is_empty() => Ok(CompilationUnit { imports, class }),
            _ => Err(self.errors),
        }
    }

    // ========================================================================
    // Token Management
    // ========================================================================

    /// Get the current token.
    #[inline]
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    /// Get the current token's span.
    #[inline]
    pub fn current_span(&self) -> Span {
        self.tokens[self.pos].1
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].1
    }

    /// Peek `n` tokens ahead of the current one (`peek_nth(0)` is current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> &Token {
        let index = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[index].0
    }

    /// Peek at the next token (lookahead).
    #[inline]
    pub fn peek(&self) -> &Token {
        self.peek_nth(1)
    }

    /// Advance to the next token, returning the previous current token.
    pub fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].0.clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    /// Check if the current token matches the given kind.
    #[inline]
    pub fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(expected)
    }

    /// Check if we've reached EOF.
    #[inline]
    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Consume the current token if it matches, reporting whether it did.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it matches the expected kind.
    pub fn expect(&mut self, expected: Token) -> Result<Token, ParseError> {
        if self.check(&expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected_token(&[expected]))
        }
    }

    /// Consume an identifier.
    pub fn expect_identifier(&mut self) -> Result<(String, Span), ParseError> {
        let span = self.current_span();
        match self.current() {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance();
                Ok((name, span))
            }
            _ => Err(self.unexpected_token(&[Token::Identifier(String::new())])),
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record a parse error and keep going.
    pub fn record(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Create an "unexpected token" error at the current position.
    pub fn unexpected_token(&self, expected: &[Token]) -> ParseError {
        let span = self.current_span();
        if self.at_eof() {
            ParseError::unexpected_eof(expected.to_vec(), span)
        } else {
            ParseError::unexpected_token(expected.to_vec(), self.current().clone(), span)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> CompilationUnit {
        Parser::new(source).unwrap().parse().unwrap()
    }

    fn parse_errors(source: &str) -> Vec<ParseError> {
        Parser::new(source).unwrap().parse().unwrap_err()
    }

    #[test]
    fn test_parser_advance() {
        let mut parser = Parser::new("class A").unwrap();
        assert!(matches!(parser.current(), Token::Class));
        assert!(matches!(parser.peek(), Token::Identifier(_)));
        parser.advance();
        parser.advance();
        assert!(parser.at_eof());
        parser.advance();
        assert!(parser.at_eof());
    }

    #[test]
    fn test_imports_and_class() {
        let unit = parse("import com.acme.Greeter;\nimport com.acme.Util;\npublic class A {}");
        let paths: Vec<&str> = unit.imports.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["com.acme.Greeter", "com.acme.Util"]);
        assert_eq!(unit.class.name, "A");
        assert!(unit.class.members.is_empty());
    }

    #[test]
    fn test_second_class_rejected() {
        let errors = parse_errors("class A {} class B {}");
        assert!(errors[0].message.contains("only one class"));
    }

    #[test]
    fn test_member_errors_are_collected() {
        let errors = parse_errors(
            "class A {\n  int x = ;\n  int y = 1;\n  void m() { return 1 }\n}",
        );
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].span.line, 2);
        assert_eq!(errors[1].span.line, 4);
    }

    #[test]
    fn test_missing_class() {
        let errors = parse_errors("import a.B;");
        assert!(matches!(errors[0].kind, ParseErrorKind::UnexpectedEof { .. }));
    }
}
