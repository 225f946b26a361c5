//! Static types and type-name resolution.

use super::diagnostic::Diagnostic;
use crate::classpath::ClassPath;
use crate::descriptor::types::{BUILTIN_TYPES, CLASS, HANDLER, METHOD, OBJECT, STRING};
use crate::descriptor::{PrimitiveKind, TypeRef};
use crate::script::ast::{Import, TypeName};
use rustc_hash::FxHashMap;
use std::fmt;

/// Compile-time type of an expression.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Ty {
    Void,
    /// Type of the `null` literal
    Null,
    Prim(PrimitiveKind),
    Ref(TypeRef),
    /// An expression that already produced a diagnostic
    Error,
}

impl Ty {
    pub fn of(ty: &TypeRef) -> Ty {
        match ty {
            TypeRef::Void => Ty::Void,
            TypeRef::Primitive(kind) => Ty::Prim(*kind),
            other => Ty::Ref(other.clone()),
        }
    }

    pub fn string() -> Ty {
        Ty::Ref(TypeRef::string())
    }

    pub fn object() -> Ty {
        Ty::Ref(TypeRef::object())
    }

    pub fn boolean() -> Ty {
        Ty::Prim(PrimitiveKind::Boolean)
    }

    pub fn int() -> Ty {
        Ty::Prim(PrimitiveKind::Int)
    }

    /// The type as it would appear in a signature.
    pub fn to_type_ref(&self) -> TypeRef {
        match self {
            Ty::Void => TypeRef::Void,
            Ty::Prim(kind) => TypeRef::Primitive(*kind),
            Ty::Ref(ty) => ty.clone(),
            Ty::Null | Ty::Error => TypeRef::object(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Ty::Prim(PrimitiveKind::Boolean) | Ty::Error)
    }

    pub fn numeric(&self) -> Option<PrimitiveKind> {
        match self {
            Ty::Prim(kind) if kind.is_numeric() => Some(*kind),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Ty::Ref(TypeRef::Named(name)) if name == STRING)
    }

    /// Reference-typed, including `null`.
    pub fn is_reference(&self) -> bool {
        matches!(self, Ty::Ref(_) | Ty::Null)
    }

    /// Name of the named reference type, if this is one.
    pub fn named(&self) -> Option<&str> {
        match self {
            Ty::Ref(TypeRef::Named(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Void => f.write_str("void"),
            Ty::Null => f.write_str("<null>"),
            Ty::Prim(kind) => write!(f, "{}", kind),
            Ty::Ref(ty) => write!(f, "{}", ty),
            Ty::Error => f.write_str("<error>"),
        }
    }
}

/// Resolves type names written in a unit to qualified types.
pub(crate) struct TypeScope<'a> {
    classpath: &'a ClassPath,
    imports: FxHashMap<String, String>,
    own_name: String,
}

impl<'a> TypeScope<'a> {
    /// Build the scope, reporting unknown and conflicting imports.
    pub fn new(
        classpath: &'a ClassPath,
        imports: &[Import],
        own_name: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Self {
        let mut map: FxHashMap<String, String> = FxHashMap::default();
        for import in imports {
            if !classpath.resolves(&import.path) {
                diagnostics.push(Diagnostic::new(
                    format!("cannot find symbol: class {}", import.path),
                    import.span,
                ));
                continue;
            }
            let simple = import.path.rsplit('.').next().unwrap_or(&import.path);
            match map.get(simple) {
                Some(existing) if existing != &import.path => {
                    diagnostics.push(Diagnostic::new(
                        format!(
                            "{} is already defined in a single-type import ({})",
                            simple, existing
                        ),
                        import.span,
                    ));
                }
                _ => {
                    map.insert(simple.to_string(), import.path.clone());
                }
            }
        }
        Self {
            classpath,
            imports: map,
            own_name: own_name.to_string(),
        }
    }

    pub fn classpath(&self) -> &'a ClassPath {
        self.classpath
    }

    /// Resolve a written type.
    pub fn resolve(&self, ty: &TypeName) -> Result<TypeRef, Diagnostic> {
        let mut resolved = match PrimitiveKind::from_keyword(&ty.name) {
            Some(kind) => TypeRef::Primitive(kind),
            None => TypeRef::Named(self.resolve_name(&ty.name).ok_or_else(|| {
                Diagnostic::new(format!("cannot find symbol: class {}", ty.name), ty.span)
            })?),
        };
        for _ in 0..ty.dims {
            resolved = TypeRef::array_of(resolved);
        }
        Ok(resolved)
    }

    fn resolve_name(&self, name: &str) -> Option<String> {
        if name.contains('.') {
            return self.classpath.contains(name).then(|| name.to_string());
        }
        if name == self.own_name || BUILTIN_TYPES.contains(&name) {
            return Some(name.to_string());
        }
        if let Some(qualified) = self.imports.get(name) {
            return Some(qualified.clone());
        }
        self.classpath.contains(name).then(|| name.to_string())
    }
}

/// Signature of a method provided by the runtime for builtin receivers.
pub(crate) struct BuiltinSignature {
    pub params: Vec<Ty>,
    pub return_type: Ty,
    /// Extra arguments of any reference or primitive type are accepted
    pub varargs: bool,
}

fn builtin(params: Vec<Ty>, return_type: Ty) -> Option<BuiltinSignature> {
    Some(BuiltinSignature {
        params,
        return_type,
        varargs: false,
    })
}

/// Builtin method available on a receiver of static type `receiver`.
pub(crate) fn builtin_method(receiver: &Ty, name: &str, arity: usize) -> Option<BuiltinSignature> {
    let specific = match receiver.named() {
        Some(STRING) => match (name, arity) {
            ("length", 0) => builtin(vec![], Ty::int()),
            ("isEmpty", 0) => builtin(vec![], Ty::boolean()),
            ("toUpperCase" | "toLowerCase" | "trim", 0) => builtin(vec![], Ty::string()),
            ("concat", 1) => builtin(vec![Ty::string()], Ty::string()),
            ("contains", 1) => builtin(vec![Ty::string()], Ty::boolean()),
            _ => None,
        },
        Some(CLASS) => match (name, arity) {
            ("getName" | "getSimpleName", 0) => builtin(vec![], Ty::string()),
            _ => None,
        },
        Some(METHOD) => match (name, arity) {
            ("getName", 0) => builtin(vec![], Ty::string()),
            ("getParameterCount", 0) => builtin(vec![], Ty::int()),
            _ => None,
        },
        Some(HANDLER) if name == "call" && arity >= 2 => Some(BuiltinSignature {
            params: vec![
                Ty::Ref(TypeRef::named(CLASS)),
                Ty::Ref(TypeRef::named(METHOD)),
            ],
            return_type: Ty::object(),
            varargs: true,
        }),
        _ => None,
    };
    specific.or_else(|| match (name, arity) {
        ("toString", 0) => builtin(vec![], Ty::string()),
        ("equals", 1) => builtin(vec![Ty::object()], Ty::boolean()),
        ("hashCode", 0) => builtin(vec![], Ty::int()),
        _ => None,
    })
}

/// Whether `name` is the universal base type.
pub(crate) fn is_object(name: &str) -> bool {
    name == OBJECT
}
