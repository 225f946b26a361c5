//! Runtime values.

use super::object::Object;
use crate::descriptor::types::{CLASS, HANDLER, METHOD, OBJECT, STRING};
use crate::descriptor::{MethodDescriptor, PrimitiveKind, TypeDescriptor, TypeRef};
use crate::proxy::CallHandler;
use std::fmt;
use std::sync::Arc;

/// A value flowing through generated code, natives and handlers.
#[derive(Clone, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// `boolean`
    Bool(bool),
    /// `byte`
    Byte(i8),
    /// `short`
    Short(i16),
    /// `char`
    Char(char),
    /// `int`
    Int(i32),
    /// `long`
    Long(i64),
    /// `float`
    Float(f32),
    /// `double`
    Double(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Instance of a generated class
    Object(Object),
    /// Type identity
    Class(Arc<TypeDescriptor>),
    /// Method identity
    Method(Arc<MethodDescriptor>),
    /// Call handler reference
    Handler(Arc<dyn CallHandler>),
    /// Array of values
    Array(Arc<Vec<Value>>),
}

/// Integer or floating operand after promotion.
enum Numeric {
    Integral(i64),
    Floating(f64),
}

impl Value {
    /// A string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// An array value.
    pub fn array(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(Arc::new(items.into_iter().collect()))
    }

    /// Initial value of a field or local of type `ty`.
    pub fn default_for(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Primitive(kind) => match kind {
                PrimitiveKind::Boolean => Value::Bool(false),
                PrimitiveKind::Byte => Value::Byte(0),
                PrimitiveKind::Short => Value::Short(0),
                PrimitiveKind::Char => Value::Char('\0'),
                PrimitiveKind::Int => Value::Int(0),
                PrimitiveKind::Long => Value::Long(0),
                PrimitiveKind::Float => Value::Float(0.0),
                PrimitiveKind::Double => Value::Double(0.0),
            },
            _ => Value::Null,
        }
    }

    /// Whether this is the null reference.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Primitive kind of this value, `None` for references.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        let kind = match self {
            Value::Bool(_) => PrimitiveKind::Boolean,
            Value::Byte(_) => PrimitiveKind::Byte,
            Value::Short(_) => PrimitiveKind::Short,
            Value::Char(_) => PrimitiveKind::Char,
            Value::Int(_) => PrimitiveKind::Int,
            Value::Long(_) => PrimitiveKind::Long,
            Value::Float(_) => PrimitiveKind::Float,
            Value::Double(_) => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }

    /// Runtime type name, used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Str(_) => STRING.to_string(),
            Value::Object(object) => object.class().name().to_string(),
            Value::Class(_) => CLASS.to_string(),
            Value::Method(_) => METHOD.to_string(),
            Value::Handler(_) => HANDLER.to_string(),
            Value::Array(_) => format!("{}[]", OBJECT),
            primitive => primitive
                .primitive_kind()
                .map(|kind| kind.keyword().to_string())
                .unwrap_or_default(),
        }
    }

    /// The value of a `boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value of an `int`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value of a `long`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The value of a `double`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// The contents of a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The referenced object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        let n = match self {
            Value::Byte(v) => Numeric::Integral(i64::from(*v)),
            Value::Short(v) => Numeric::Integral(i64::from(*v)),
            Value::Char(c) => Numeric::Integral(i64::from(u32::from(*c) as u16)),
            Value::Int(v) => Numeric::Integral(i64::from(*v)),
            Value::Long(v) => Numeric::Integral(*v),
            Value::Float(v) => Numeric::Floating(f64::from(*v)),
            Value::Double(v) => Numeric::Floating(*v),
            _ => return None,
        };
        Some(n)
    }

    /// Primitive conversion as performed by a cast (`(int) 3.7` is `3`).
    ///
    /// Integral narrowing wraps; floating to integral truncates and
    /// saturates. `None` when the value is not primitive or the conversion
    /// mixes `boolean` with a numeric kind.
    pub fn convert(&self, kind: PrimitiveKind) -> Option<Value> {
        if kind == PrimitiveKind::Boolean {
            return matches!(self, Value::Bool(_)).then(|| self.clone());
        }
        let value = match (kind, self.numeric()?) {
            (PrimitiveKind::Byte, Numeric::Integral(v)) => Value::Byte(v as i8),
            (PrimitiveKind::Byte, Numeric::Floating(v)) => Value::Byte(v as i32 as i8),
            (PrimitiveKind::Short, Numeric::Integral(v)) => Value::Short(v as i16),
            (PrimitiveKind::Short, Numeric::Floating(v)) => Value::Short(v as i32 as i16),
            (PrimitiveKind::Char, Numeric::Integral(v)) => Value::Char(char_from_code(v as u16)),
            (PrimitiveKind::Char, Numeric::Floating(v)) => {
                Value::Char(char_from_code(v as i32 as u16))
            }
            (PrimitiveKind::Int, Numeric::Integral(v)) => Value::Int(v as i32),
            (PrimitiveKind::Int, Numeric::Floating(v)) => Value::Int(v as i32),
            (PrimitiveKind::Long, Numeric::Integral(v)) => Value::Long(v),
            (PrimitiveKind::Long, Numeric::Floating(v)) => Value::Long(v as i64),
            (PrimitiveKind::Float, Numeric::Integral(v)) => Value::Float(v as f32),
            (PrimitiveKind::Float, Numeric::Floating(v)) => Value::Float(v as f32),
            (PrimitiveKind::Double, Numeric::Integral(v)) => Value::Double(v as f64),
            (PrimitiveKind::Double, Numeric::Floating(v)) => Value::Double(v),
            (PrimitiveKind::Boolean, _) => return None,
        };
        Some(value)
    }

    /// Convert this value for a slot of type `target`, allowing primitive
    /// widening. `None` when the value does not conform.
    pub fn coerce_to(&self, target: &TypeRef) -> Option<Value> {
        match target {
            TypeRef::Void => None,
            TypeRef::Primitive(kind) => {
                let from = self.primitive_kind()?;
                if from.widens_to(*kind) {
                    self.convert(*kind)
                } else {
                    None
                }
            }
            TypeRef::Named(name) if name == OBJECT => Some(self.clone()),
            _ if self.is_null() => Some(Value::Null),
            TypeRef::Named(name) => {
                let conforms = match (name.as_str(), self) {
                    (STRING, Value::Str(_))
                    | (CLASS, Value::Class(_))
                    | (METHOD, Value::Method(_))
                    | (HANDLER, Value::Handler(_)) => true,
                    (other, Value::Object(object)) => object.class().is_subtype_of(other),
                    _ => false,
                };
                conforms.then(|| self.clone())
            }
            TypeRef::Array(element) => match self {
                Value::Array(items) if items.iter().all(|v| v.is_instance_of(element)) => {
                    Some(self.clone())
                }
                _ => None,
            },
        }
    }

    /// Whether the value already is of type `target`, without conversion.
    pub fn is_instance_of(&self, target: &TypeRef) -> bool {
        match target {
            TypeRef::Primitive(kind) => self.primitive_kind() == Some(*kind),
            other => self.coerce_to(other).is_some(),
        }
    }
}

fn char_from_code(code: u16) -> char {
    char::from_u32(u32::from(code)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// Format a floating value the way generated code prints it: whole numbers
/// keep one decimal (`1.0`), very large or small magnitudes use exponents.
fn format_floating(f: &mut fmt::Formatter<'_>, v: f64) -> fmt::Result {
    if v.is_nan() {
        f.write_str("NaN")
    } else if v.is_infinite() {
        f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
    } else if v == v.trunc() && v.abs() < 1e7 {
        write!(f, "{:.1}", v)
    } else if v != 0.0 && (v.abs() >= 1e7 || v.abs() < 1e-3) {
        write!(f, "{:E}", v)
    } else {
        write!(f, "{}", v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => format_floating(f, f64::from(*v)),
            Value::Double(v) => format_floating(f, *v),
            Value::Str(s) => f.write_str(s),
            Value::Object(object) => write!(f, "{}@{:x}", object.class().name(), object.id()),
            Value::Class(descriptor) => {
                let keyword = if descriptor.is_interface() {
                    "interface"
                } else {
                    "class"
                };
                write!(f, "{} {}", keyword, descriptor.name)
            }
            Value::Method(method) => write!(f, "{}", method),
            Value::Handler(_) => f.write_str(HANDLER),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Object(object) => f
                .debug_struct("Object")
                .field("class", &object.class().name())
                .field("id", &object.id())
                .finish(),
            Value::Class(descriptor) => write!(f, "Class({})", descriptor.name),
            Value::Method(method) => write!(f, "Method({})", method.signature()),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            other if other.primitive_kind().is_some() => {
                write!(f, "{}({})", other.kind_name(), other)
            }
            other => write!(f, "{}", other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.same(b),
            (Value::Class(a), Value::Class(b)) => a == b,
            (Value::Method(a), Value::Method(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => {
                std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
            }
            (Value::Array(a), Value::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::string(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(Arc::from(v))
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<TypeDescriptor> for Value {
    fn from(v: TypeDescriptor) -> Self {
        Value::Class(Arc::new(v))
    }
}

impl From<MethodDescriptor> for Value {
    fn from(v: MethodDescriptor) -> Self {
        Value::Method(Arc::new(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Double(1.0).to_string(), "1.0");
        assert_eq!(Value::Double(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(3.0).to_string(), "3.0");
        assert_eq!(Value::Double(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(
            Value::array([Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
        assert_eq!(
            Value::from(TypeDescriptor::interface("a.Greeter")).to_string(),
            "interface a.Greeter"
        );
    }

    #[test]
    fn test_convert() {
        assert_eq!(Value::Double(3.7).convert(PrimitiveKind::Int), Some(Value::Int(3)));
        assert_eq!(Value::Int(300).convert(PrimitiveKind::Byte), Some(Value::Byte(44)));
        assert_eq!(Value::Int(65).convert(PrimitiveKind::Char), Some(Value::Char('A')));
        assert_eq!(Value::Char('A').convert(PrimitiveKind::Int), Some(Value::Int(65)));
        assert_eq!(
            Value::Double(f64::NAN).convert(PrimitiveKind::Long),
            Some(Value::Long(0))
        );
        assert_eq!(Value::Bool(true).convert(PrimitiveKind::Int), None);
        assert_eq!(Value::Int(1).convert(PrimitiveKind::Boolean), None);
        assert_eq!(Value::from("1").convert(PrimitiveKind::Int), None);
    }

    #[test]
    fn test_coerce_primitives() {
        assert_eq!(Value::Int(4).coerce_to(&TypeRef::long()), Some(Value::Long(4)));
        assert_eq!(Value::Long(4).coerce_to(&TypeRef::int()), None);
        assert_eq!(
            Value::Char('a').coerce_to(&TypeRef::Primitive(PrimitiveKind::Short)),
            None
        );
        assert_eq!(Value::Null.coerce_to(&TypeRef::int()), None);
        assert_eq!(Value::Int(1).coerce_to(&TypeRef::Void), None);
    }

    #[test]
    fn test_coerce_references() {
        assert_eq!(Value::Int(4).coerce_to(&TypeRef::object()), Some(Value::Int(4)));
        assert_eq!(Value::Null.coerce_to(&TypeRef::string()), Some(Value::Null));
        assert!(Value::from("x").coerce_to(&TypeRef::string()).is_some());
        assert!(Value::Int(1).coerce_to(&TypeRef::string()).is_none());
        assert!(Value::from(MethodDescriptor::new("m"))
            .coerce_to(&TypeRef::named(METHOD))
            .is_some());

        let strings = Value::array([Value::from("a"), Value::Null]);
        assert!(strings
            .coerce_to(&TypeRef::array_of(TypeRef::string()))
            .is_some());
        let ints = Value::array([Value::Int(1)]);
        assert!(ints.coerce_to(&TypeRef::array_of(TypeRef::int())).is_some());
        assert!(ints.coerce_to(&TypeRef::array_of(TypeRef::long())).is_none());
    }

    #[test]
    fn test_instance_of_is_exact_for_primitives() {
        assert!(Value::Int(1).is_instance_of(&TypeRef::int()));
        assert!(!Value::Int(1).is_instance_of(&TypeRef::long()));
        assert!(Value::Int(1).is_instance_of(&TypeRef::object()));
    }

    #[test]
    fn test_equality() {
        assert_eq!(Value::from("a"), Value::from(String::from("a")));
        assert_ne!(Value::Int(1), Value::Long(1));
        assert_ne!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        let handler: Arc<dyn CallHandler> =
            Arc::new(|_: &TypeDescriptor, _: &MethodDescriptor, _: &[Value]| {
                Ok::<_, crate::MorphError>(Value::Null)
            });
        assert_eq!(
            Value::Handler(handler.clone()),
            Value::Handler(handler.clone())
        );
    }
}
