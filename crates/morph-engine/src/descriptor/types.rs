//! Type references used in method signatures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the universal base type.
pub const OBJECT: &str = "Object";
/// Name of the builtin string type.
pub const STRING: &str = "String";
/// Name of the builtin type-identity type.
pub const CLASS: &str = "Class";
/// Name of the builtin method-descriptor type.
pub const METHOD: &str = "Method";
/// Name of the builtin call-handler type.
pub const HANDLER: &str = "Handler";

/// Builtin reference type names, always resolvable without a classpath entry.
pub const BUILTIN_TYPES: [&str; 5] = [OBJECT, STRING, CLASS, METHOD, HANDLER];

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// `boolean`
    Boolean,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `char`
    Char,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds in declaration order.
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Short,
        PrimitiveKind::Char,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Source keyword for this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Parse a source keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        PrimitiveKind::ALL
            .into_iter()
            .find(|kind| kind.keyword() == keyword)
    }

    /// Whether values of this kind take part in arithmetic.
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    /// Widening rank used for numeric promotion (higher is wider).
    pub(crate) fn rank(self) -> u8 {
        match self {
            PrimitiveKind::Boolean => 0,
            PrimitiveKind::Byte => 1,
            PrimitiveKind::Short | PrimitiveKind::Char => 2,
            PrimitiveKind::Int => 3,
            PrimitiveKind::Long => 4,
            PrimitiveKind::Float => 5,
            PrimitiveKind::Double => 6,
        }
    }

    /// Unary numeric promotion: sub-int kinds become `int`.
    pub fn promoted(self) -> Self {
        match self {
            PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char => PrimitiveKind::Int,
            other => other,
        }
    }

    /// Binary numeric promotion of two operand kinds.
    pub fn promote_with(self, other: PrimitiveKind) -> Self {
        let wider = if self.rank() >= other.rank() { self } else { other };
        wider.promoted()
    }

    /// Whether a value of `self` may be implicitly widened to `target`.
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        if self == target {
            return true;
        }
        if !self.is_numeric() || !target.is_numeric() {
            return false;
        }
        match (self, target) {
            // char and short/byte are not mutually assignable
            (PrimitiveKind::Char, PrimitiveKind::Short | PrimitiveKind::Byte) => false,
            (PrimitiveKind::Byte | PrimitiveKind::Short, PrimitiveKind::Char) => false,
            _ => self.rank() < target.rank(),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A reference to a type as it appears in a signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeRef {
    /// No value (method return only)
    Void,
    /// A primitive kind
    Primitive(PrimitiveKind),
    /// A class or interface by qualified name
    Named(String),
    /// An array of the element type
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// `boolean`
    pub fn boolean() -> Self {
        TypeRef::Primitive(PrimitiveKind::Boolean)
    }

    /// `int`
    pub fn int() -> Self {
        TypeRef::Primitive(PrimitiveKind::Int)
    }

    /// `long`
    pub fn long() -> Self {
        TypeRef::Primitive(PrimitiveKind::Long)
    }

    /// `double`
    pub fn double() -> Self {
        TypeRef::Primitive(PrimitiveKind::Double)
    }

    /// `String`
    pub fn string() -> Self {
        TypeRef::Named(STRING.to_string())
    }

    /// `Object`
    pub fn object() -> Self {
        TypeRef::Named(OBJECT.to_string())
    }

    /// A class or interface by qualified name.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    /// An array with this element type.
    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// Whether this is the `void` return type.
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Fully qualified spelling, e.g. `int`, `com.acme.Greeter`, `String[]`.
    pub fn canonical_name(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(kind) => kind.keyword().to_string(),
            TypeRef::Named(name) => name.clone(),
            TypeRef::Array(element) => format!("{}[]", element.canonical_name()),
        }
    }

    /// Last path segment of the canonical name.
    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Named(name) => name.rsplit('.').next().unwrap_or(name).to_string(),
            TypeRef::Array(element) => format!("{}[]", element.simple_name()),
            other => other.canonical_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_names() {
        assert_eq!(TypeRef::int().canonical_name(), "int");
        assert_eq!(TypeRef::Void.canonical_name(), "void");
        assert_eq!(TypeRef::named("com.acme.Greeter").canonical_name(), "com.acme.Greeter");
        assert_eq!(
            TypeRef::array_of(TypeRef::array_of(TypeRef::string())).canonical_name(),
            "String[][]"
        );
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(TypeRef::named("com.acme.Greeter").simple_name(), "Greeter");
        assert_eq!(TypeRef::array_of(TypeRef::named("a.B")).simple_name(), "B[]");
        assert_eq!(TypeRef::long().simple_name(), "long");
    }

    #[test]
    fn test_promotion() {
        use PrimitiveKind::*;
        assert_eq!(Byte.promote_with(Short), Int);
        assert_eq!(Int.promote_with(Long), Long);
        assert_eq!(Float.promote_with(Long), Float);
        assert_eq!(Char.promote_with(Double), Double);
        assert_eq!(Char.promoted(), Int);
    }

    #[test]
    fn test_keyword_round_trip() {
        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(PrimitiveKind::from_keyword("String"), None);
    }

    #[test]
    fn test_widening() {
        assert!(PrimitiveKind::Int.widens_to(PrimitiveKind::Long));
        assert!(PrimitiveKind::Char.widens_to(PrimitiveKind::Int));
        assert!(PrimitiveKind::Long.widens_to(PrimitiveKind::Float));
        assert!(!PrimitiveKind::Long.widens_to(PrimitiveKind::Int));
        assert!(!PrimitiveKind::Char.widens_to(PrimitiveKind::Short));
        assert!(!PrimitiveKind::Boolean.widens_to(PrimitiveKind::Int));
    }
}
