//! Statement parsing

use super::{decl, expr, ParseError, Parser};
use crate::script::ast::{Block, Stmt};
use crate::script::token::Token;

/// Parse `{ stmt* }`.
pub fn parse_block(parser: &mut Parser) -> Result<Block, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftBrace)?;
    let mut statements = Vec::new();
    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        statements.push(parse_statement(parser)?);
    }
    parser.expect(Token::RightBrace)?;
    Ok(Block {
        statements,
        span: start.to(&parser.previous_span()),
    })
}

/// Parse a statement.
pub fn parse_statement(parser: &mut Parser) -> Result<Stmt, ParseError> {
    let start = parser.current_span();
    match parser.current() {
        Token::LeftBrace => Ok(Stmt::Block(parse_block(parser)?)),
        Token::Semicolon => {
            parser.advance();
            Ok(Stmt::Empty(start))
        }
        Token::Return => {
            parser.advance();
            let value = if parser.check(&Token::Semicolon) {
                None
            } else {
                Some(expr::parse_expression(parser)?)
            };
            expect_semicolon(parser)?;
            Ok(Stmt::Return {
                value,
                span: start.to(&parser.previous_span()),
            })
        }
        Token::Throw => {
            parser.advance();
            let value = expr::parse_expression(parser)?;
            expect_semicolon(parser)?;
            Ok(Stmt::Throw {
                value,
                span: start.to(&parser.previous_span()),
            })
        }
        Token::If => {
            parser.advance();
            let condition = parse_condition(parser)?;
            let then_branch = Box::new(parse_statement(parser)?);
            let else_branch = if parser.eat(&Token::Else) {
                Some(Box::new(parse_statement(parser)?))
            } else {
                None
            };
            Ok(Stmt::If {
                condition,
                then_branch,
                else_branch,
                span: start.to(&parser.previous_span()),
            })
        }
        Token::While => {
            parser.advance();
            let condition = parse_condition(parser)?;
            let body = Box::new(parse_statement(parser)?);
            Ok(Stmt::While {
                condition,
                body,
                span: start.to(&parser.previous_span()),
            })
        }
        Token::Final => {
            // `final` on a local is accepted and ignored
            parser.advance();
            parse_local(parser)
        }
        _ if looks_like_declaration(parser) => parse_local(parser),
        _ => {
            let expression = expr::parse_expression(parser)?;
            expect_semicolon(parser)?;
            Ok(Stmt::Expr(expression))
        }
    }
}

fn parse_condition(parser: &mut Parser) -> Result<crate::script::ast::Expr, ParseError> {
    parser.expect(Token::LeftParen)?;
    let condition = expr::parse_expression(parser)?;
    parser.expect(Token::RightParen)?;
    Ok(condition)
}

fn parse_local(parser: &mut Parser) -> Result<Stmt, ParseError> {
    let start = parser.current_span();
    let ty = decl::parse_type(parser)?;
    let (name, _) = parser.expect_identifier()?;
    let init = if parser.eat(&Token::Equal) {
        Some(expr::parse_expression(parser)?)
    } else {
        None
    };
    expect_semicolon(parser)?;
    Ok(Stmt::Local {
        ty,
        name,
        init,
        span: start.to(&parser.previous_span()),
    })
}

fn expect_semicolon(parser: &mut Parser) -> Result<(), ParseError> {
    parser
        .expect(Token::Semicolon)
        .map(|_| ())
        .map_err(|e| e.with_suggestion("Add a semicolon at the end of the statement"))
}

/// Whether the tokens at the current position read `Type name`.
fn looks_like_declaration(parser: &Parser) -> bool {
    let mut n = match parser.current() {
        Token::Primitive(_) => 1,
        Token::Identifier(_) => {
            let mut n = 1;
            while matches!(parser.peek_nth(n), Token::Dot)
                && matches!(parser.peek_nth(n + 1), Token::Identifier(_))
            {
                n += 2;
            }
            n
        }
        _ => return false,
    };
    while matches!(parser.peek_nth(n), Token::LeftBracket)
        && matches!(parser.peek_nth(n + 1), Token::RightBracket)
    {
        n += 2;
    }
    matches!(parser.peek_nth(n), Token::Identifier(_))
}
