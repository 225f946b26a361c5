//! Syntax tree of one class source unit.

#![allow(missing_docs)]

use super::token::Span;
use crate::descriptor::Visibility;

/// A parsed source file: imports plus exactly one class.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub imports: Vec<Import>,
    pub class: ClassDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Qualified name as written
    pub path: String,
    pub span: Span,
}

/// A type as written: a (possibly qualified) name plus array dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeName {
    pub name: String,
    pub dims: usize,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Modifiers {
    /// `None` for package visibility
    pub visibility: Option<Visibility>,
    pub is_static: bool,
    pub is_final: bool,
}

impl Modifiers {
    pub fn visibility(&self) -> Visibility {
        self.visibility.unwrap_or(Visibility::Package)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub modifiers: Modifiers,
    pub name: String,
    pub superclass: Option<TypeName>,
    pub interfaces: Vec<TypeName>,
    pub members: Vec<Member>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub modifiers: Modifiers,
    pub ty: TypeName,
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeName,
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub modifiers: Modifiers,
    /// `None` for `void`
    pub return_type: Option<TypeName>,
    pub name: String,
    pub params: Vec<Param>,
    pub throws: Vec<TypeName>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Block),
    Local {
        ty: TypeName,
        name: String,
        init: Option<Expr>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
    Expr(Expr),
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Block(block) => &block.span,
            Stmt::Local { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Empty(span) => span,
            Stmt::Expr(expr) => &expr.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    /// A bare identifier: local, parameter or field
    Name(String),
    This,
    /// `target.name`
    FieldAccess {
        target: Box<Expr>,
        name: String,
    },
    /// `target.name(args)`, or `name(args)` on `this`
    Call {
        target: Option<Box<Expr>>,
        name: String,
        args: Vec<Expr>,
    },
    /// `super.name(args)`
    SuperCall {
        name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Cast {
        ty: TypeName,
        expr: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
}

pub use super::unit::BinaryOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// `=` or a compound assignment carrying its arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Compound(BinaryOp),
}
