//! Declaration parsing: imports, the class header, and members.

use super::{stmt, ParseError, Parser};
use crate::descriptor::Visibility;
use crate::script::ast::*;
use crate::script::token::Token;

/// Parse `import a.b.C;`.
pub fn parse_import(parser: &mut Parser) -> Result<Import, ParseError> {
    let start = parser.current_span();
    parser.expect(Token::Import)?;
    let (path, _) = parse_qualified_name(parser)?;
    parser.expect(Token::Semicolon)?;
    Ok(Import {
        path,
        span: start.to(&parser.previous_span()),
    })
}

/// Parse the class declaration and all its members.
pub fn parse_class(parser: &mut Parser) -> Result<ClassDecl, ParseError> {
    let start = parser.current_span();
    let modifiers = parse_modifiers(parser)?;
    parser.expect(Token::Class)?;
    let (name, _) = parser.expect_identifier()?;

    let superclass = if parser.eat(&Token::Extends) {
        Some(parse_type(parser)?)
    } else {
        None
    };

    let mut interfaces = Vec::new();
    if parser.eat(&Token::Implements) {
        interfaces.push(parse_type(parser)?);
        while parser.eat(&Token::Comma) {
            interfaces.push(parse_type(parser)?);
        }
    }

    parser.expect(Token::LeftBrace)?;

    let mut members = Vec::new();
    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        let member_start = parser.pos;
        match parse_member(parser, &name) {
            Ok(member) => members.push(member),
            Err(err) => {
                parser.record(err);
                parser.pos = member_start;
                sync_to_member_boundary(parser);
            }
        }
    }
    parser.expect(Token::RightBrace)?;

    Ok(ClassDecl {
        modifiers,
        name,
        superclass,
        interfaces,
        members,
        span: start.to(&parser.previous_span()),
    })
}

fn parse_member(parser: &mut Parser, class_name: &str) -> Result<Member, ParseError> {
    let start = parser.current_span();
    let modifiers = parse_modifiers(parser)?;

    // Constructor: ClassName '('
    if let Token::Identifier(name) = parser.current() {
        if name == class_name && matches!(parser.peek(), Token::LeftParen) {
            let name = name.clone();
            parser.advance();
            let params = parse_params(parser)?;
            let body = stmt::parse_block(parser)?;
            return Ok(Member::Constructor(ConstructorDecl {
                modifiers,
                name,
                params,
                span: start.to(&body.span),
                body,
            }));
        }
    }

    let return_type = if parser.eat(&Token::Void) {
        None
    } else {
        Some(parse_type(parser)?)
    };
    let (name, name_span) = parser.expect_identifier()?;

    if parser.check(&Token::LeftParen) {
        let params = parse_params(parser)?;
        let mut throws = Vec::new();
        if parser.eat(&Token::Throws) {
            throws.push(parse_type(parser)?);
            while parser.eat(&Token::Comma) {
                throws.push(parse_type(parser)?);
            }
        }
        let body = stmt::parse_block(parser)?;
        return Ok(Member::Method(MethodDecl {
            modifiers,
            return_type,
            name,
            params,
            throws,
            span: start.to(&body.span),
            body,
        }));
    }

    let Some(ty) = return_type else {
        return Err(ParseError::invalid_syntax(
            format!("field '{}' cannot have type void", name),
            name_span,
        ));
    };
    let init = if parser.eat(&Token::Equal) {
        Some(super::expr::parse_expression(parser)?)
    } else {
        None
    };
    parser.expect(Token::Semicolon)?;
    Ok(Member::Field(FieldDecl {
        modifiers,
        ty,
        name,
        init,
        span: start.to(&parser.previous_span()),
    }))
}

/// Parse any sequence of modifiers.
pub fn parse_modifiers(parser: &mut Parser) -> Result<Modifiers, ParseError> {
    let mut modifiers = Modifiers::default();
    while parser.current().is_modifier() {
        let span = parser.current_span();
        let visibility = match parser.advance() {
            Token::Public => Some(Visibility::Public),
            Token::Protected => Some(Visibility::Protected),
            Token::Private => Some(Visibility::Private),
            Token::Static => {
                modifiers.is_static = true;
                None
            }
            _ => {
                modifiers.is_final = true;
                None
            }
        };
        if let Some(visibility) = visibility {
            if modifiers.visibility.is_some() {
                return Err(ParseError::invalid_syntax(
                    "multiple visibility modifiers",
                    span,
                ));
            }
            modifiers.visibility = Some(visibility);
        }
    }
    Ok(modifiers)
}

/// Parse `a.b.C`.
pub fn parse_qualified_name(
    parser: &mut Parser,
) -> Result<(String, crate::script::token::Span), ParseError> {
    let (mut name, start) = parser.expect_identifier()?;
    while parser.check(&Token::Dot) && matches!(parser.peek(), Token::Identifier(_)) {
        parser.advance();
        let (segment, _) = parser.expect_identifier()?;
        name.push('.');
        name.push_str(&segment);
    }
    Ok((name, start.to(&parser.previous_span())))
}

/// Parse a primitive keyword or qualified name, plus `[]` dimensions.
pub fn parse_type(parser: &mut Parser) -> Result<TypeName, ParseError> {
    let start = parser.current_span();
    let name = match parser.current() {
        Token::Primitive(kind) => {
            let name = kind.keyword().to_string();
            parser.advance();
            name
        }
        Token::Identifier(_) => parse_qualified_name(parser)?.0,
        _ => {
            return Err(parser
                .unexpected_token(&[Token::Identifier(String::new())])
                .with_suggestion("Expected a type name"))
        }
    };

    let mut dims = 0;
    while parser.check(&Token::LeftBracket) && matches!(parser.peek(), Token::RightBracket) {
        parser.advance();
        parser.advance();
        dims += 1;
    }

    Ok(TypeName {
        name,
        dims,
        span: start.to(&parser.previous_span()),
    })
}

fn parse_params(parser: &mut Parser) -> Result<Vec<Param>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut params = Vec::new();
    if !parser.check(&Token::RightParen) {
        loop {
            let ty = parse_type(parser)?;
            let (name, span) = parser.expect_identifier()?;
            params.push(Param {
                span: ty.span.to(&span),
                ty,
                name,
            });
            if !parser.eat(&Token::Comma) {
                break;
            }
        }
    }
    parser.expect(Token::RightParen)?;
    Ok(params)
}

/// Skip the member starting at the current position.
///
/// Stops after a `;` or a balanced `{ ... }` at nesting depth zero, or before
/// the `}` closing the class.
pub fn sync_to_member_boundary(parser: &mut Parser) {
    let mut depth = 0usize;
    while !parser.at_eof() {
        match parser.current() {
            Token::LeftBrace => depth += 1,
            Token::RightBrace => {
                if depth == 0 {
                    return;
                }
                depth -= 1;
                if depth == 0 {
                    parser.advance();
                    return;
                }
            }
            Token::Semicolon if depth == 0 => {
                parser.advance();
                return;
            }
            _ => {}
        }
        parser.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PrimitiveKind;

    fn class(source: &str) -> ClassDecl {
        Parser::new(source).unwrap().parse().unwrap().class
    }

    #[test]
    fn test_class_header() {
        let class = class("public class Rtc1 extends com.acme.Base implements a.I, b.J {}");
        assert_eq!(class.modifiers.visibility, Some(Visibility::Public));
        assert_eq!(class.superclass.unwrap().name, "com.acme.Base");
        let interfaces: Vec<String> = class.interfaces.into_iter().map(|t| t.name).collect();
        assert_eq!(interfaces, vec!["a.I", "b.J"]);
    }

    #[test]
    fn test_members() {
        let class = class(
            "class A {\n\
               private static final int LIMIT = 3;\n\
               String[][] grid;\n\
               public A() { }\n\
               protected long sum(int a, long b) throws x.Oops, Error { return a + b; }\n\
               void run() {}\n\
             }",
        );
        assert_eq!(class.members.len(), 5);

        let Member::Field(limit) = &class.members[0] else {
            panic!("expected field");
        };
        assert!(limit.modifiers.is_static && limit.modifiers.is_final);
        assert_eq!(limit.modifiers.visibility(), Visibility::Private);
        assert!(limit.init.is_some());

        let Member::Field(grid) = &class.members[1] else {
            panic!("expected field");
        };
        assert_eq!((grid.ty.name.as_str(), grid.ty.dims), ("String", 2));
        assert_eq!(grid.modifiers.visibility(), Visibility::Package);

        assert!(matches!(&class.members[2], Member::Constructor(c) if c.params.is_empty()));

        let Member::Method(sum) = &class.members[3] else {
            panic!("expected method");
        };
        assert_eq!(sum.name, "sum");
        assert_eq!(sum.return_type.as_ref().unwrap().name, PrimitiveKind::Long.keyword());
        assert_eq!(sum.params.len(), 2);
        assert_eq!(sum.params[1].name, "b");
        assert_eq!(sum.throws.len(), 2);

        let Member::Method(run) = &class.members[4] else {
            panic!("expected method");
        };
        assert!(run.return_type.is_none());
    }

    #[test]
    fn test_void_field_rejected() {
        let errors = Parser::new("class A { void x; }").unwrap().parse().unwrap_err();
        assert!(errors[0].message.contains("cannot have type void"));
    }

    #[test]
    fn test_duplicate_visibility_rejected() {
        let errors = Parser::new("class A { public private int x; }")
            .unwrap()
            .parse()
            .unwrap_err();
        assert!(errors[0].message.contains("multiple visibility"));
    }
}
