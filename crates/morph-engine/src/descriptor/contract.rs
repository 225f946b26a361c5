//! Type descriptors: the contracts the engine synthesizes implementations for.

use super::method::{ConstructorDescriptor, MethodDescriptor};
use super::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Interface type
    Interface,
    /// Concrete class
    Class,
    /// Class that cannot be instantiated
    AbstractClass,
    /// One of the eight primitive types
    Primitive,
    /// Array type
    Array,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Interface => "interface",
            TypeKind::Class => "class",
            TypeKind::AbstractClass => "abstract class",
            TypeKind::Primitive => "primitive",
            TypeKind::Array => "array",
        };
        f.write_str(name)
    }
}

/// Read-only metadata describing a class or interface.
///
/// Equality and hashing are structural, so two descriptors built from the
/// same declarations are the same cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Fully qualified name
    pub name: String,
    /// Interface, class, abstract class, primitive or array
    pub kind: TypeKind,
    /// Direct superclass (classes only); `None` means `Object`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superclass: Option<String>,
    /// Directly implemented or extended interfaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    /// Declared constructors; empty means an implicit public no-arg constructor
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constructors: Vec<ConstructorDescriptor>,
    /// Declared methods in declaration order
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            superclass: None,
            interfaces: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Descriptor of an interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    /// Descriptor of a concrete class.
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    /// Descriptor of an abstract class.
    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::AbstractClass)
    }

    /// Descriptor of a primitive type.
    pub fn primitive(kind: super::PrimitiveKind) -> Self {
        Self::with_kind(kind.keyword(), TypeKind::Primitive)
    }

    /// Descriptor of an array type with the given element type.
    pub fn array(element: TypeRef) -> Self {
        Self::with_kind(TypeRef::array_of(element).canonical_name(), TypeKind::Array)
    }

    /// Add a declared method.
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Add several declared methods, in order.
    pub fn methods(mut self, methods: impl IntoIterator<Item = MethodDescriptor>) -> Self {
        self.methods.extend(methods);
        self
    }

    /// Add a declared constructor.
    pub fn constructor(mut self, constructor: ConstructorDescriptor) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Set the direct superclass.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Add a directly implemented (or, for interfaces, extended) interface.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Whether this describes an interface.
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Concrete or abstract class.
    pub fn is_class(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::AbstractClass)
    }

    /// Interfaces and abstract classes.
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::AbstractClass)
    }

    /// Whether this kind of type can be used as a generation contract.
    pub fn is_contract_kind(&self) -> bool {
        !matches!(self.kind, TypeKind::Primitive | TypeKind::Array)
    }

    /// Abstract methods declared directly on this type.
    pub fn abstract_methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.iter().filter(|m| m.is_abstract)
    }

    /// Declared methods with the given name and arity.
    pub fn find_methods<'a>(
        &'a self,
        name: &'a str,
        arity: usize,
    ) -> impl Iterator<Item = &'a MethodDescriptor> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.name == name && m.arity() == arity)
    }

    /// Whether a subclass may be created with an implicit no-arg constructor.
    pub fn has_default_constructor(&self) -> bool {
        self.constructors.is_empty()
            || self
                .constructors
                .iter()
                .any(ConstructorDescriptor::is_default_accessible)
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Package part of the qualified name, if any.
    pub fn package(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(package, _)| package)
    }

    /// Parse a descriptor from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.name)
    }
}
