//! Methods every value answers without a class declaring them.

use super::object::Object;
use super::value::Value;
use crate::error::{MorphError, MorphResult};
use std::sync::Arc;

/// `toString`, `equals` and `hashCode` on a generated instance.
///
/// Returns `None` when `name`/arity is not a builtin so dispatch can report
/// the missing method itself.
pub(crate) fn invoke_object(object: &Object, name: &str, args: &[Value]) -> Option<MorphResult<Value>> {
    let result = match (name, args) {
        ("toString", []) => Value::from(identity_string(object)),
        ("equals", [other]) => Value::Bool(other.as_object().is_some_and(|o| o.same(object))),
        ("hashCode", []) => Value::Int(object.id() as i32),
        _ => return None,
    };
    Some(Ok(result))
}

/// Builtin methods of non-object values.
pub(crate) fn invoke_value(receiver: &Value, name: &str, args: &[Value]) -> Option<MorphResult<Value>> {
    let specific = match receiver {
        Value::Str(s) => string_method(s, name, args),
        Value::Class(descriptor) => match (name, args) {
            ("getName", []) => Some(Ok(Value::string(&descriptor.name))),
            ("getSimpleName", []) => Some(Ok(Value::string(descriptor.simple_name()))),
            _ => None,
        },
        Value::Method(method) => match (name, args) {
            ("getName", []) => Some(Ok(Value::string(&method.name))),
            ("getParameterCount", []) => Some(Ok(Value::Int(method.arity() as i32))),
            _ => None,
        },
        Value::Handler(handler) if name == "call" => Some(match args {
            [Value::Class(iface), Value::Method(method), rest @ ..] => {
                handler.call(iface, method, rest)
            }
            _ => Err(MorphError::IllegalArgument(
                "Handler.call expects (Class, Method, args...)".to_string(),
            )),
        }),
        _ => None,
    };
    specific.or_else(|| {
        let result = match (name, args) {
            ("toString", []) => Value::from(receiver.to_string()),
            ("equals", [other]) => Value::Bool(receiver == other),
            ("hashCode", []) => Value::Int(hash_code(receiver)),
            _ => return None,
        };
        Some(Ok(result))
    })
}

fn string_method(s: &Arc<str>, name: &str, args: &[Value]) -> Option<MorphResult<Value>> {
    let value = match (name, args) {
        ("length", []) => Value::Int(s.encode_utf16().count() as i32),
        ("isEmpty", []) => Value::Bool(s.is_empty()),
        ("toUpperCase", []) => Value::from(s.to_uppercase()),
        ("toLowerCase", []) => Value::from(s.to_lowercase()),
        ("trim", []) => Value::string(s.trim()),
        ("concat", [other]) => match other.as_str() {
            Some(other) => Value::from(format!("{}{}", s, other)),
            None => return Some(Err(string_argument("concat", other))),
        },
        ("contains", [other]) => match other.as_str() {
            Some(other) => Value::Bool(s.contains(other)),
            None => return Some(Err(string_argument("contains", other))),
        },
        _ => return None,
    };
    Some(Ok(value))
}

fn string_argument(method: &str, found: &Value) -> MorphError {
    if found.is_null() {
        MorphError::NullReference(format!("String.{} argument", method))
    } else {
        MorphError::IllegalArgument(format!(
            "String.{} expects a String, found {}",
            method,
            found.kind_name()
        ))
    }
}

/// `Name@hex` identity rendering of an instance.
pub(crate) fn identity_string(object: &Object) -> String {
    format!("{}@{:x}", object.class().name(), object.id())
}

/// Text of a value in string concatenation. Instances render through their
/// own `toString`.
pub(crate) fn stringify(value: &Value) -> MorphResult<String> {
    match value {
        Value::Object(object) => {
            let rendered = object.invoke("toString", &[])?;
            Ok(match rendered {
                Value::Str(s) => s.to_string(),
                other => other.to_string(),
            })
        }
        other => Ok(other.to_string()),
    }
}

/// Hash of a string over its UTF-16 code units (`s[0]*31^(n-1) + ...`).
pub(crate) fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}

fn fold_long(v: i64) -> i32 {
    (v ^ ((v as u64) >> 32) as i64) as i32
}

fn hash_code(value: &Value) -> i32 {
    match value {
        Value::Null => 0,
        Value::Bool(true) => 1231,
        Value::Bool(false) => 1237,
        Value::Byte(v) => i32::from(*v),
        Value::Short(v) => i32::from(*v),
        Value::Char(v) => *v as i32,
        Value::Int(v) => *v,
        Value::Long(v) => fold_long(*v),
        Value::Float(v) => v.to_bits() as i32,
        Value::Double(v) => fold_long(v.to_bits() as i64),
        Value::Str(s) => string_hash(s),
        Value::Object(object) => object.id() as i32,
        Value::Class(descriptor) => string_hash(&descriptor.name),
        Value::Method(method) => string_hash(&method.signature()),
        Value::Handler(handler) => Arc::as_ptr(handler) as *const () as usize as i32,
        Value::Array(items) => items
            .iter()
            .fold(1i32, |h, item| h.wrapping_mul(31).wrapping_add(hash_code(item))),
    }
}
