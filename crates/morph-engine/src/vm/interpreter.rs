//! Tree-walking interpreter for compiled unit bodies.

use super::builtins;
use super::class::Artifact;
use super::object::Object;
use super::value::Value;
use crate::descriptor::TypeRef;
use crate::error::{MorphError, MorphResult};
use crate::script::unit::{BinaryOp, CastMode, Constant, ConstructorDef, Expr, MethodDef, Stmt, UnaryOp};
use std::cell::Cell;

thread_local! {
    static CALL_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts nested calls on the current thread.
struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> MorphResult<Self> {
        CALL_DEPTH.with(|depth| {
            if depth.get() >= limit {
                return Err(MorphError::StackOverflow { depth: limit });
            }
            depth.set(depth.get() + 1);
            Ok(DepthGuard)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        CALL_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Activation record of one body.
struct Frame<'a> {
    this: Option<&'a Object>,
    class: &'a Artifact,
    locals: Vec<Value>,
}

enum Flow {
    Normal,
    Return(Value),
}

/// Run a method on `object` with already converted arguments.
pub(crate) fn call_method(object: &Object, method: &MethodDef, args: Vec<Value>) -> MorphResult<Value> {
    let class = object.class();
    let _guard = DepthGuard::enter(class.max_call_depth())?;
    let mut frame = Frame::new(Some(object), class, method.locals, args);
    match frame.exec_block(&method.body)? {
        Flow::Return(value) if !method.return_type.is_void() => {
            value.coerce_to(&method.return_type).ok_or_else(|| {
                MorphError::InvalidResultType {
                    expected: method.return_type.to_string(),
                    found: value.kind_name(),
                }
            })
        }
        _ => Ok(Value::Null),
    }
}

/// Run the body of a constructor.
pub(crate) fn run_constructor(object: &Object, constructor: &ConstructorDef) -> MorphResult<()> {
    let class = object.class();
    let _guard = DepthGuard::enter(class.max_call_depth())?;
    let mut frame = Frame::new(Some(object), class, constructor.locals, Vec::new());
    frame.exec_block(&constructor.body)?;
    Ok(())
}

/// Evaluate a field initializer.
pub(crate) fn eval_initializer(
    class: &Artifact,
    this: Option<&Object>,
    init: &Expr,
    ty: &TypeRef,
) -> MorphResult<Value> {
    let mut frame = Frame::new(this, class, 0, Vec::new());
    let value = frame.eval(init)?;
    value.coerce_to(ty).ok_or_else(|| MorphError::InvalidResultType {
        expected: ty.to_string(),
        found: value.kind_name(),
    })
}

impl<'a> Frame<'a> {
    fn new(this: Option<&'a Object>, class: &'a Artifact, locals: usize, args: Vec<Value>) -> Self {
        let mut slots = args;
        if slots.len() < locals {
            slots.resize(locals, Value::Null);
        }
        Self {
            this,
            class,
            locals: slots,
        }
    }

    fn this(&self) -> MorphResult<&'a Object> {
        self.this
            .ok_or_else(|| MorphError::NullReference("this".to_string()))
    }

    fn local(&mut self, slot: usize) -> MorphResult<&mut Value> {
        let class = self.class.name();
        self.locals
            .get_mut(slot)
            .ok_or_else(|| MorphError::IllegalArgument(format!("{} has no local slot {}", class, slot)))
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> MorphResult<Flow> {
        for stmt in stmts {
            if let Flow::Return(value) = self.exec(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> MorphResult<Flow> {
        match stmt {
            Stmt::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(None) => Ok(Flow::Return(Value::Null)),
            Stmt::Return(Some(expr)) => Ok(Flow::Return(self.eval(expr)?)),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.condition(condition)? {
                    self.exec_block(then_branch)
                } else {
                    self.exec_block(else_branch)
                }
            }
            Stmt::While { condition, body } => {
                while self.condition(condition)? {
                    if let Flow::Return(value) = self.exec_block(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Throw(expr) => Err(MorphError::Thrown(self.eval(expr)?)),
            Stmt::Block(stmts) => self.exec_block(stmts),
        }
    }

    fn condition(&mut self, expr: &Expr) -> MorphResult<bool> {
        let value = self.eval(expr)?;
        value.as_bool().ok_or_else(|| MorphError::InvalidResultType {
            expected: "boolean".to_string(),
            found: value.kind_name(),
        })
    }

    fn eval(&mut self, expr: &Expr) -> MorphResult<Value> {
        match expr {
            Expr::Const(constant) => Ok(constant_value(constant)),
            Expr::Local(slot) => Ok(self.local(*slot)?.clone()),
            Expr::This => Ok(Value::Object(self.this()?.clone())),
            Expr::Field(slot) => self.this()?.field_value(*slot),
            Expr::Static(slot) => self.class.static_value(*slot),
            Expr::StoreLocal(slot, value) => {
                let value = self.eval(value)?;
                *self.local(*slot)? = value.clone();
                Ok(value)
            }
            Expr::StoreField(slot, value) => {
                let value = self.eval(value)?;
                self.this()?.set_field_value(*slot, value.clone())?;
                Ok(value)
            }
            Expr::StoreStatic(slot, value) => {
                let value = self.eval(value)?;
                self.class.set_static_value(*slot, value.clone())?;
                Ok(value)
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand)?;
                unary(*op, value)
            }
            Expr::Binary(op, left, right) => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                binary(*op, left, right)
            }
            Expr::And(left, right) => Ok(Value::Bool(self.condition(left)? && self.condition(right)?)),
            Expr::Or(left, right) => Ok(Value::Bool(self.condition(left)? || self.condition(right)?)),
            Expr::Conditional(condition, then_expr, else_expr) => {
                if self.condition(condition)? {
                    self.eval(then_expr)
                } else {
                    self.eval(else_expr)
                }
            }
            Expr::Cast { target, mode, expr } => {
                let value = self.eval(expr)?;
                cast(target, *mode, value)
            }
            Expr::Invoke {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval(receiver)?;
                let args = self.eval_args(args)?;
                invoke(&receiver, method, &args)
            }
            Expr::InvokeSuper { method, args } => {
                let args = self.eval_args(args)?;
                self.this()?.invoke_inherited(method, &args)
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> MorphResult<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}

fn constant_value(constant: &Constant) -> Value {
    match constant {
        Constant::Null => Value::Null,
        Constant::Bool(v) => Value::Bool(*v),
        Constant::Int(v) => Value::Int(*v),
        Constant::Long(v) => Value::Long(*v),
        Constant::Float(v) => Value::Float(*v),
        Constant::Double(v) => Value::Double(*v),
        Constant::Char(v) => Value::Char(*v),
        Constant::Str(v) => Value::string(v),
    }
}

/// Invoke a method on any value.
pub(crate) fn invoke(receiver: &Value, method: &str, args: &[Value]) -> MorphResult<Value> {
    match receiver {
        Value::Null => Err(MorphError::NullReference(method.to_string())),
        Value::Object(object) => object.invoke(method, args),
        other => builtins::invoke_value(other, method, args).unwrap_or_else(|| {
            Err(MorphError::NoSuchMethod {
                class: other.kind_name(),
                method: format!("{}/{}", method, args.len()),
            })
        }),
    }
}

fn invalid_operands(op: impl std::fmt::Display, left: &Value, right: &Value) -> MorphError {
    MorphError::IllegalArgument(format!(
        "bad operands for '{}': {} and {}",
        op,
        left.kind_name(),
        right.kind_name()
    ))
}

fn unary(op: UnaryOp, value: Value) -> MorphResult<Value> {
    match op {
        UnaryOp::Not => value
            .as_bool()
            .map(|b| Value::Bool(!b))
            .ok_or_else(|| MorphError::IllegalArgument(format!("bad operand for '!': {}", value.kind_name()))),
        UnaryOp::Negate => {
            let promoted = value
                .primitive_kind()
                .filter(|kind| kind.is_numeric())
                .and_then(|kind| value.convert(kind.promoted()));
            match promoted {
                Some(Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
                Some(Value::Long(v)) => Ok(Value::Long(v.wrapping_neg())),
                Some(Value::Float(v)) => Ok(Value::Float(-v)),
                Some(Value::Double(v)) => Ok(Value::Double(-v)),
                _ => Err(MorphError::IllegalArgument(format!(
                    "bad operand for '-': {}",
                    value.kind_name()
                ))),
            }
        }
    }
}

/// Promote two numeric operands to their common kind.
fn promote(left: &Value, right: &Value) -> Option<(Value, Value)> {
    let a = left.primitive_kind().filter(|k| k.is_numeric())?;
    let b = right.primitive_kind().filter(|k| k.is_numeric())?;
    let kind = a.promote_with(b);
    Some((left.convert(kind)?, right.convert(kind)?))
}

fn division_by_zero() -> MorphError {
    MorphError::Arithmetic("/ by zero".to_string())
}

fn binary(op: BinaryOp, left: Value, right: Value) -> MorphResult<Value> {
    if op == BinaryOp::Add && (matches!(left, Value::Str(_)) || matches!(right, Value::Str(_))) {
        let mut text = builtins::stringify(&left)?;
        text.push_str(&builtins::stringify(&right)?);
        return Ok(Value::from(text));
    }

    let Some(operands) = promote(&left, &right) else {
        return match op {
            BinaryOp::Eq => Ok(Value::Bool(left == right)),
            BinaryOp::Ne => Ok(Value::Bool(left != right)),
            _ => Err(invalid_operands(op, &left, &right)),
        };
    };

    let value = match operands {
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Add => Value::Int(a.wrapping_add(b)),
            BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
            BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
            BinaryOp::Div if b == 0 => return Err(division_by_zero()),
            BinaryOp::Div => Value::Int(a.wrapping_div(b)),
            BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
            BinaryOp::Rem => Value::Int(a.wrapping_rem(b)),
            cmp => Value::Bool(compare(cmp, a.partial_cmp(&b))),
        },
        (Value::Long(a), Value::Long(b)) => match op {
            BinaryOp::Add => Value::Long(a.wrapping_add(b)),
            BinaryOp::Sub => Value::Long(a.wrapping_sub(b)),
            BinaryOp::Mul => Value::Long(a.wrapping_mul(b)),
            BinaryOp::Div if b == 0 => return Err(division_by_zero()),
            BinaryOp::Div => Value::Long(a.wrapping_div(b)),
            BinaryOp::Rem if b == 0 => return Err(division_by_zero()),
            BinaryOp::Rem => Value::Long(a.wrapping_rem(b)),
            cmp => Value::Bool(compare(cmp, a.partial_cmp(&b))),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            BinaryOp::Add => Value::Float(a + b),
            BinaryOp::Sub => Value::Float(a - b),
            BinaryOp::Mul => Value::Float(a * b),
            BinaryOp::Div => Value::Float(a / b),
            BinaryOp::Rem => Value::Float(a % b),
            cmp => Value::Bool(compare(cmp, a.partial_cmp(&b))),
        },
        (Value::Double(a), Value::Double(b)) => match op {
            BinaryOp::Add => Value::Double(a + b),
            BinaryOp::Sub => Value::Double(a - b),
            BinaryOp::Mul => Value::Double(a * b),
            BinaryOp::Div => Value::Double(a / b),
            BinaryOp::Rem => Value::Double(a % b),
            cmp => Value::Bool(compare(cmp, a.partial_cmp(&b))),
        },
        _ => return Err(invalid_operands(op, &left, &right)),
    };
    Ok(value)
}

/// Evaluate a comparison; unordered operands (NaN) compare false except `!=`.
fn compare(op: BinaryOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::*;
    match (op, ordering) {
        (BinaryOp::Ne, None) => true,
        (_, None) => false,
        (BinaryOp::Eq, Some(o)) => o == Equal,
        (BinaryOp::Ne, Some(o)) => o != Equal,
        (BinaryOp::Lt, Some(o)) => o == Less,
        (BinaryOp::Le, Some(o)) => o != Greater,
        (BinaryOp::Gt, Some(o)) => o == Greater,
        (BinaryOp::Ge, Some(o)) => o != Less,
        _ => false,
    }
}

fn cast(target: &TypeRef, mode: CastMode, value: Value) -> MorphResult<Value> {
    let mismatch = |value: &Value| MorphError::InvalidResultType {
        expected: target.to_string(),
        found: value.kind_name(),
    };
    match (mode, target) {
        (CastMode::Convert, TypeRef::Primitive(kind)) => {
            value.convert(*kind).ok_or_else(|| mismatch(&value))
        }
        (CastMode::Check, TypeRef::Primitive(kind)) => {
            if value.primitive_kind() == Some(*kind) {
                Ok(value)
            } else {
                Err(mismatch(&value))
            }
        }
        (_, target) => value.coerce_to(target).ok_or_else(|| mismatch(&value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::ClassPath;
    use crate::vm::testing::load;

    fn run(body: &str) -> MorphResult<Value> {
        let source = format!("public class T {{ public Object run() {{ {} }} }}", body);
        let class = load(&source, &ClassPath::new());
        class.instantiate()?.invoke("run", &[])
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("return 1 + 2 * 3;").unwrap(), Value::Int(7));
        assert_eq!(run("return (1 + 2) * 3;").unwrap(), Value::Int(9));
        assert_eq!(run("return 10 - 4 - 3;").unwrap(), Value::Int(3));
        assert_eq!(run("return 7 / 2;").unwrap(), Value::Int(3));
        assert_eq!(run("return -7 % 3;").unwrap(), Value::Int(-1));
        assert_eq!(run("return 7 / 2.0;").unwrap(), Value::Double(3.5));
        assert_eq!(run("return 1L + 2;").unwrap(), Value::Long(3));
        assert_eq!(run("return 2147483647 + 1;").unwrap(), Value::Int(i32::MIN));
        assert_eq!(run("return 'a' + 1;").unwrap(), Value::Int(98));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(run("return 1 / 0;"), Err(MorphError::Arithmetic(_))));
        assert!(matches!(run("return 1L % 0L;"), Err(MorphError::Arithmetic(_))));
        assert_eq!(run("return 1.0 / 0;").unwrap(), Value::Double(f64::INFINITY));
    }

    #[test]
    fn test_strings() {
        assert_eq!(run("return \"a\" + 1 + 2;").unwrap(), Value::from("a12"));
        assert_eq!(run("return 1 + 2 + \"a\";").unwrap(), Value::from("3a"));
        assert_eq!(run("return \"x\" + 1.0 + null;").unwrap(), Value::from("x1.0null"));
        assert_eq!(run("String s = \"ab\"; return s == \"a\" + \"b\";").unwrap(), Value::Bool(true));
        assert_eq!(run("return \"Hi\".toUpperCase().length();").unwrap(), Value::Int(2));
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            run("int i = 0; int sum = 0; while (i < 5) { i += 1; sum += i; } return sum;").unwrap(),
            Value::Int(15)
        );
        assert_eq!(
            run("int x = 3; if (x > 2 && x < 5) return \"in\"; else return \"out\";").unwrap(),
            Value::from("in")
        );
        assert_eq!(run("boolean b = false; return b || !b;").unwrap(), Value::Bool(true));
        assert_eq!(run("return 1 > 2 ? \"a\" : \"b\";").unwrap(), Value::from("b"));
    }

    #[test]
    fn test_casts() {
        assert_eq!(run("return (int) 3.9;").unwrap(), Value::Int(3));
        assert_eq!(run("return (byte) 200;").unwrap(), Value::Byte(-56));
        assert_eq!(run("Object o = 5; return (int) o;").unwrap(), Value::Int(5));
        assert!(matches!(
            run("Object o = \"s\"; return (int) o;"),
            Err(MorphError::InvalidResultType { .. })
        ));
        assert!(matches!(
            run("Object o = 5L; return (int) o;"),
            Err(MorphError::InvalidResultType { .. })
        ));
        assert!(matches!(
            run("Object o = 5; return (String) o;"),
            Err(MorphError::InvalidResultType { .. })
        ));
    }

    #[test]
    fn test_throw_and_null() {
        assert!(matches!(run("throw \"boom\";"), Err(MorphError::Thrown(Value::Str(_)))));
        assert!(matches!(
            run("String s = null; return s.length();"),
            Err(MorphError::NullReference(_))
        ));
    }

    #[test]
    fn test_compound_assignment_narrows() {
        assert_eq!(run("byte b = 120; b += 10; return b;").unwrap(), Value::Byte(-126));
        assert_eq!(run("String s = \"a\"; s += 1; return s;").unwrap(), Value::from("a1"));
    }

    #[test]
    fn test_stack_overflow() {
        let source = "public class T { public int down(int n) { return down(n + 1); } }";
        let unit = crate::script::compile_source(source, &ClassPath::new()).unwrap();
        let class = crate::vm::GeneratedClass::link(unit, &ClassPath::new(), 16).unwrap();
        let object = class.instantiate().unwrap();
        let err = object.invoke("down", &[Value::Int(0)]).unwrap_err();
        assert!(matches!(err, MorphError::StackOverflow { depth: 16 }));
        // the depth counter unwinds with the error
        assert!(matches!(
            object.invoke("down", &[Value::Int(0)]),
            Err(MorphError::StackOverflow { .. })
        ));
        assert_eq!(CALL_DEPTH.with(|d| d.get()), 0);
    }
}
