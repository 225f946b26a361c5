//! Compiled units.
//!
//! A unit is the resolved, checked form of one class: names are bound to
//! slots, types are fully qualified and conversions are explicit. Units are
//! serialized as `<Class>.unit.json` by the compiler and read back by the
//! loader.

use crate::descriptor::{TypeRef, Visibility};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Bumped whenever the serialized layout changes.
pub const UNIT_FORMAT_VERSION: u32 = 1;

/// File suffix of compiled units.
pub const UNIT_EXTENSION: &str = "unit.json";

/// Path of the compiled unit for `class_name` inside `dir`.
pub fn unit_path(dir: &Path, class_name: &str) -> PathBuf {
    dir.join(format!("{}.{}", class_name, UNIT_EXTENSION))
}

/// One compiled class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledClass {
    /// Layout version, see [`UNIT_FORMAT_VERSION`]
    pub format_version: u32,
    /// Class name
    pub name: String,
    /// Qualified superclass name (`Object` when none was declared)
    pub superclass: String,
    /// Qualified interface names
    pub interfaces: Vec<String>,
    /// Instance fields; the index is the slot
    pub fields: Vec<FieldDef>,
    /// Static fields; the index is the static slot
    pub statics: Vec<FieldDef>,
    /// Declared constructors; empty means the implicit no-argument one
    pub constructors: Vec<ConstructorDef>,
    /// Declared methods, in source order
    pub methods: Vec<MethodDef>,
}

impl CompiledClass {
    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Read a unit serialized by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// A field of a compiled class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name
    pub name: String,
    /// Declared type
    pub ty: TypeRef,
    /// Declared visibility
    pub visibility: Visibility,
    /// Whether the field was declared `final`
    pub is_final: bool,
    /// Initializer, evaluated at construction (or load, for statics)
    pub init: Option<Expr>,
}

/// A constructor of a compiled class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDef {
    /// Parameter types
    pub params: Vec<TypeRef>,
    /// Declared visibility
    pub visibility: Visibility,
    /// Local slots needed, parameters included
    pub locals: usize,
    /// Lowered body
    pub body: Vec<Stmt>,
}

/// A method of a compiled class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Parameter types
    pub params: Vec<TypeRef>,
    /// Return type, `Void` for none
    pub return_type: TypeRef,
    /// Declared exception type names
    pub throws: Vec<String>,
    /// Declared visibility
    pub visibility: Visibility,
    /// Local slots needed, parameters included
    pub locals: usize,
    /// Lowered body
    pub body: Vec<Stmt>,
}

impl MethodDef {
    /// `name(T1,T2)` using canonical parameter names.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(TypeRef::canonical_name).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

/// A lowered statement.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Expr(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Throw(Expr),
    Block(Vec<Stmt>),
}

/// A lowered expression. Locals, fields and statics are addressed by slot.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Const(Constant),
    Local(usize),
    This,
    Field(usize),
    Static(usize),
    StoreLocal(usize, Box<Expr>),
    StoreField(usize, Box<Expr>),
    StoreStatic(usize, Box<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Cast {
        target: TypeRef,
        mode: CastMode,
        expr: Box<Expr>,
    },
    /// Virtual call on any value
    Invoke {
        receiver: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    /// Call skipping the generated class's own methods
    InvokeSuper {
        method: String,
        args: Vec<Expr>,
    },
}

/// A literal value.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    Str(String),
}

/// Unary operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Arithmetic and comparison operators.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Whether the operator yields a boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How a cast treats its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastMode {
    /// Operand is statically primitive: numeric conversion
    Convert,
    /// Operand is a reference: the runtime kind must match exactly
    Check,
}
