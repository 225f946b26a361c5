//! Method and constructor descriptors.

use super::types::TypeRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to subclasses
    Protected,
    /// No modifier
    Package,
    /// Visible only inside the declaring type
    Private,
}

impl Visibility {
    /// Source keyword, `None` for package visibility.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Protected => Some("protected"),
            Visibility::Package => None,
            Visibility::Private => Some("private"),
        }
    }
}

/// Metadata for one declared method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Return type, `Void` for none
    #[serde(default = "void_type")]
    pub return_type: TypeRef,
    /// Ordered parameter types
    #[serde(default)]
    pub params: Vec<TypeRef>,
    /// Declared exception type names
    #[serde(default)]
    pub throws: Vec<String>,
    /// Declared visibility
    #[serde(default)]
    pub visibility: Visibility,
    /// Whether the method has no implementation on its declaring type
    #[serde(default = "default_abstract")]
    pub is_abstract: bool,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

fn default_abstract() -> bool {
    true
}

impl MethodDescriptor {
    /// A public abstract `void name()` method; refine with the builder methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: TypeRef::Void,
            params: Vec::new(),
            throws: Vec::new(),
            visibility: Visibility::Public,
            is_abstract: true,
        }
    }

    /// Set the return type.
    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.return_type = return_type;
        self
    }

    /// Append a parameter type.
    pub fn param(mut self, ty: TypeRef) -> Self {
        self.params.push(ty);
        self
    }

    /// Append several parameter types.
    pub fn params(mut self, params: impl IntoIterator<Item = TypeRef>) -> Self {
        self.params.extend(params);
        self
    }

    /// Declare a thrown exception type.
    pub fn throws(mut self, exception: impl Into<String>) -> Self {
        self.throws.push(exception.into());
        self
    }

    /// Set the visibility.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark the method as having an implementation on its declaring type.
    pub fn concrete(mut self) -> Self {
        self.is_abstract = false;
        self
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// `name(T1,T2)` using canonical parameter names.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(TypeRef::canonical_name).collect();
        format!("{}({})", self.name, params.join(","))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.return_type, self.signature())
    }
}

/// Metadata for one declared constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    /// Ordered parameter types
    #[serde(default)]
    pub params: Vec<TypeRef>,
    /// Declared visibility
    #[serde(default)]
    pub visibility: Visibility,
}

impl ConstructorDescriptor {
    /// The public no-argument constructor.
    pub fn no_args() -> Self {
        Self::default()
    }

    /// A public constructor taking `params`.
    pub fn with_params(params: impl IntoIterator<Item = TypeRef>) -> Self {
        Self {
            params: params.into_iter().collect(),
            visibility: Visibility::Public,
        }
    }

    /// Set the visibility.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Whether a subclass may chain to this constructor implicitly.
    pub fn is_default_accessible(&self) -> bool {
        self.params.is_empty() && self.visibility != Visibility::Private
    }
}
