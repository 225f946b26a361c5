//! Expression parsing
//!
//! Precedence climbing for binary operators; assignment and `?:` are right
//! associative and handled above the binary levels.

use super::precedence::{binary_op, compound_op, get_precedence, Precedence};
use super::{decl, ParseError, Parser};
use crate::script::ast::*;
use crate::script::token::Token;

/// Parse an expression.
pub fn parse_expression(parser: &mut Parser) -> Result<Expr, ParseError> {
    parse_assignment(parser)
}

fn parse_assignment(parser: &mut Parser) -> Result<Expr, ParseError> {
    let target = parse_conditional(parser)?;

    let op = match parser.current() {
        Token::Equal => AssignOp::Assign,
        other => match compound_op(other) {
            Some(op) => AssignOp::Compound(op),
            None => return Ok(target),
        },
    };

    let is_target = match &target.kind {
        ExprKind::Name(_) => true,
        ExprKind::FieldAccess { target, .. } => matches!(target.kind, ExprKind::This),
        _ => false,
    };
    if !is_target {
        return Err(ParseError::invalid_syntax(
            "left side of an assignment must be a variable or this.field",
            target.span,
        ));
    }

    parser.advance();
    let value = parse_assignment(parser)?;
    let span = target.span.to(&value.span);
    Ok(Expr::new(
        ExprKind::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        },
        span,
    ))
}

fn parse_conditional(parser: &mut Parser) -> Result<Expr, ParseError> {
    let condition = parse_binary(parser, Precedence::LogicalOr as u8)?;
    if !parser.eat(&Token::Question) {
        return Ok(condition);
    }
    let then_expr = parse_expression(parser)?;
    parser.expect(Token::Colon)?;
    let else_expr = parse_conditional(parser)?;
    let span = condition.span.to(&else_expr.span);
    Ok(Expr::new(
        ExprKind::Conditional {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        },
        span,
    ))
}

fn parse_binary(parser: &mut Parser, min: u8) -> Result<Expr, ParseError> {
    let mut left = parse_unary(parser)?;

    loop {
        let precedence = get_precedence(parser.current()) as u8;
        if precedence == Precedence::None as u8 || precedence < min {
            break;
        }
        let token = parser.advance();
        // operands bind one level tighter, making every level left-associative
        let right = parse_binary(parser, precedence + 1)?;
        let span = left.span.to(&right.span);
        let kind = if matches!(token, Token::AmpAmp | Token::PipePipe) {
            let op = if token == Token::AmpAmp {
                LogicalOp::And
            } else {
                LogicalOp::Or
            };
            ExprKind::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        } else {
            match binary_op(&token) {
                Some(op) => ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                None => return Err(ParseError::invalid_syntax("unknown operator", span)),
            }
        };
        left = Expr::new(kind, span);
    }

    Ok(left)
}

fn parse_unary(parser: &mut Parser) -> Result<Expr, ParseError> {
    let start = parser.current_span();
    let op = match parser.current() {
        Token::Bang => UnaryOp::Not,
        Token::Minus => UnaryOp::Negate,
        Token::Plus => UnaryOp::Plus,
        Token::LeftParen if is_cast(parser) => return parse_cast(parser),
        _ => return parse_postfix(parser),
    };
    parser.advance();

    // Fold negative int literals so that -2147483648 is representable
    if op == UnaryOp::Negate {
        if let Token::IntLiteral(n) = *parser.current() {
            if !matches!(parser.peek(), Token::Dot) {
                let span = start.to(&parser.current_span());
                parser.advance();
                let value = i32::try_from(-n)
                    .map_err(|_| ParseError::invalid_number(format!("-{}", n), span))?;
                return Ok(Expr::new(ExprKind::Literal(Literal::Int(value)), span));
            }
        }
    }

    let operand = parse_unary(parser)?;
    let span = start.to(&operand.span);
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    ))
}

/// Whether the `(` at the current position opens a cast.
fn is_cast(parser: &Parser) -> bool {
    let mut n = 1;
    let primitive = match parser.peek_nth(n) {
        Token::Primitive(_) => {
            n += 1;
            true
        }
        Token::Identifier(_) => {
            n += 1;
            while matches!(parser.peek_nth(n), Token::Dot)
                && matches!(parser.peek_nth(n + 1), Token::Identifier(_))
            {
                n += 2;
            }
            false
        }
        _ => return false,
    };
    let mut dims = 0;
    while matches!(parser.peek_nth(n), Token::LeftBracket)
        && matches!(parser.peek_nth(n + 1), Token::RightBracket)
    {
        n += 2;
        dims += 1;
    }
    if !matches!(parser.peek_nth(n), Token::RightParen) {
        return false;
    }
    if primitive && dims == 0 {
        return true;
    }
    let next = parser.peek_nth(n + 1);
    next.is_literal()
        || matches!(
            next,
            Token::Identifier(_) | Token::LeftParen | Token::Bang | Token::This | Token::Super
        )
}

fn parse_cast(parser: &mut Parser) -> Result<Expr, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::LeftParen)?;
    let ty = decl::parse_type(parser)?;
    parser.expect(Token::RightParen)?;
    let expr = parse_unary(parser)?;
    let span = start.to(&expr.span);
    Ok(Expr::new(
        ExprKind::Cast {
            ty,
            expr: Box::new(expr),
        },
        span,
    ))
}

fn parse_postfix(parser: &mut Parser) -> Result<Expr, ParseError> {
    let mut expr = parse_primary(parser)?;

    while parser.eat(&Token::Dot) {
        let (name, name_span) = parser.expect_identifier()?;
        if parser.check(&Token::LeftParen) {
            let args = parse_arguments(parser)?;
            let span = expr.span.to(&parser.previous_span());
            expr = Expr::new(
                ExprKind::Call {
                    target: Some(Box::new(expr)),
                    name,
                    args,
                },
                span,
            );
        } else {
            let span = expr.span.to(&name_span);
            expr = Expr::new(
                ExprKind::FieldAccess {
                    target: Box::new(expr),
                    name,
                },
                span,
            );
        }
    }

    Ok(expr)
}

fn parse_primary(parser: &mut Parser) -> Result<Expr, ParseError> {
    let span = parser.current_span();
    let literal = match parser.current() {
        Token::IntLiteral(n) => {
            let n = *n;
            let value = i32::try_from(n)
                .map_err(|_| ParseError::invalid_number(n.to_string(), span))?;
            Some(Literal::Int(value))
        }
        Token::LongLiteral(n) => Some(Literal::Long(*n)),
        Token::FloatLiteral(n) => Some(Literal::Float(*n)),
        Token::DoubleLiteral(n) => Some(Literal::Double(*n)),
        Token::CharLiteral(c) => Some(Literal::Char(*c)),
        Token::StringLiteral(s) => Some(Literal::String(s.clone())),
        Token::True => Some(Literal::Bool(true)),
        Token::False => Some(Literal::Bool(false)),
        Token::Null => Some(Literal::Null),
        _ => None,
    };
    if let Some(literal) = literal {
        parser.advance();
        return Ok(Expr::new(ExprKind::Literal(literal), span));
    }

    match parser.current() {
        Token::This => {
            parser.advance();
            Ok(Expr::new(ExprKind::This, span))
        }
        Token::Super => {
            parser.advance();
            parser.expect(Token::Dot)?;
            let (name, _) = parser.expect_identifier()?;
            if !parser.check(&Token::LeftParen) {
                return Err(ParseError::invalid_syntax(
                    "super may only be used to call a method",
                    span,
                ));
            }
            let args = parse_arguments(parser)?;
            Ok(Expr::new(
                ExprKind::SuperCall { name, args },
                span.to(&parser.previous_span()),
            ))
        }
        Token::Identifier(name) => {
            let name = name.clone();
            parser.advance();
            if parser.check(&Token::LeftParen) {
                let args = parse_arguments(parser)?;
                Ok(Expr::new(
                    ExprKind::Call {
                        target: None,
                        name,
                        args,
                    },
                    span.to(&parser.previous_span()),
                ))
            } else {
                Ok(Expr::new(ExprKind::Name(name), span))
            }
        }
        Token::LeftParen => {
            parser.advance();
            let mut inner = parse_expression(parser)?;
            parser.expect(Token::RightParen)?;
            inner.span = span.to(&parser.previous_span());
            Ok(inner)
        }
        _ => Err(parser
            .unexpected_token(&[])
            .with_suggestion("Expected an expression")),
    }
}

fn parse_arguments(parser: &mut Parser) -> Result<Vec<Expr>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut args = Vec::new();
    if !parser.check(&Token::RightParen) {
        loop {
            args.push(parse_expression(parser)?);
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
    }
    parser.expect(Token::RightParen)?;
    Ok(args)
}
