//! Class-level declarations and hierarchy checks.

use super::diagnostic::Diagnostic;
use super::types::{is_object, Ty, TypeScope};
use crate::classpath::{ClassPath, HostType};
use crate::descriptor::types::{BUILTIN_TYPES, OBJECT};
use crate::descriptor::{MethodDescriptor, TypeRef, Visibility};
use crate::script::ast::{ClassDecl, Member, TypeName};
use crate::script::token::Span;
use rustc_hash::FxHashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) struct FieldInfo {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_final: bool,
    /// Slot among the instance or static fields
    pub slot: usize,
}

/// A callable method as seen by the checker.
#[derive(Debug, Clone)]
pub(crate) struct MethodSig {
    pub name: String,
    pub params: Vec<TypeRef>,
    pub return_type: TypeRef,
    pub throws: Vec<String>,
    pub visibility: Visibility,
    pub is_abstract: bool,
    pub is_static: bool,
    /// Declaring type
    pub owner: String,
}

impl MethodSig {
    fn from_descriptor(owner: &str, method: &MethodDescriptor) -> Self {
        Self {
            name: method.name.clone(),
            params: method.params.clone(),
            return_type: method.return_type.clone(),
            throws: method.throws.clone(),
            visibility: method.visibility,
            is_abstract: method.is_abstract,
            is_static: false,
            owner: owner.to_string(),
        }
    }

    pub fn signature(&self) -> String {
        let params: Vec<String> = self.params.iter().map(TypeRef::simple_name).collect();
        format!("{}({})", self.name, params.join(","))
    }

    fn same_parameters(&self, other: &MethodSig) -> bool {
        self.name == other.name && self.params == other.params
    }
}

/// Everything declared by the class being compiled.
#[derive(Debug)]
pub(crate) struct ClassInfo {
    pub name: String,
    pub superclass: String,
    pub interfaces: Vec<String>,
    /// In declaration order
    pub fields: Vec<FieldInfo>,
    /// In declaration order
    pub methods: Vec<MethodSig>,
    /// Parameter lists of declared constructors, in declaration order
    pub constructors: Vec<Vec<TypeRef>>,
    pub instance_count: usize,
    pub static_count: usize,
}

/// The class being compiled plus the type scope it is checked in.
pub(crate) struct ClassContext<'a> {
    pub scope: TypeScope<'a>,
    pub info: ClassInfo,
}

impl<'a> ClassContext<'a> {
    pub fn new(scope: TypeScope<'a>, info: ClassInfo) -> Self {
        Self { scope, info }
    }

    fn classpath(&self) -> &'a ClassPath {
        self.scope.classpath()
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.info.fields.iter().find(|f| f.name == name)
    }

    /// Whether `sub` is `sup` or one of its subtypes, the class under
    /// compilation included.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup || is_object(sup) {
            return true;
        }
        if sub == self.info.name {
            return std::iter::once(&self.info.superclass)
                .chain(self.info.interfaces.iter())
                .any(|parent| self.classpath().is_subtype(parent, sup));
        }
        self.classpath().is_subtype(sub, sup)
    }

    /// Whether a value of static type `from` may be stored where `to` is
    /// expected without an explicit cast.
    pub fn is_assignable(&self, from: &Ty, to: &TypeRef) -> bool {
        match (from, to) {
            (Ty::Error, _) => true,
            (_, TypeRef::Void) | (Ty::Void, _) => false,
            (Ty::Prim(from), TypeRef::Primitive(to)) => from.widens_to(*to),
            (_, TypeRef::Primitive(_)) => false,
            (Ty::Null, _) => true,
            (Ty::Prim(_), TypeRef::Named(name)) => is_object(name),
            (Ty::Prim(_), TypeRef::Array(_)) => false,
            (Ty::Ref(TypeRef::Named(sub)), TypeRef::Named(sup)) => self.is_subtype(sub, sup),
            (Ty::Ref(TypeRef::Array(_)), TypeRef::Named(sup)) => is_object(sup),
            (Ty::Ref(TypeRef::Array(from)), TypeRef::Array(to)) => match (&**from, &**to) {
                (TypeRef::Primitive(a), TypeRef::Primitive(b)) => a == b,
                (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
                (from, to) => self.is_assignable(&Ty::of(from), to),
            },
            (Ty::Ref(_), _) => false,
        }
    }

    /// Superclass chain of the class under compilation, nearest first.
    fn superclass_chain(&self) -> Vec<Arc<HostType>> {
        let classpath = self.classpath();
        let mut chain: Vec<Arc<HostType>> = classpath.lookup(&self.info.superclass).into_iter().collect();
        chain.extend(classpath.superclasses(&self.info.superclass));
        chain
    }

    /// Interfaces implemented directly or through the superclass chain.
    fn interface_closure(&self, chain: &[Arc<HostType>]) -> Vec<Arc<HostType>> {
        let mut roots: Vec<String> = self.info.interfaces.clone();
        for host in chain {
            roots.extend(host.descriptor().interfaces.iter().cloned());
        }
        self.classpath().interface_closure(roots.iter())
    }

    /// Methods visible on a value of host type `name`, nearest declarations first.
    pub fn methods_of(&self, name: &str) -> Vec<MethodSig> {
        if name == self.info.name {
            let mut methods = self.info.methods.clone();
            methods.extend(self.inherited_methods());
            return methods;
        }
        let classpath = self.classpath();
        let Some(host) = classpath.lookup(name) else {
            return Vec::new();
        };
        let mut chain = vec![host.clone()];
        chain.extend(classpath.superclasses(name));
        let mut roots: Vec<String> = Vec::new();
        for h in &chain {
            roots.extend(h.descriptor().interfaces.iter().cloned());
        }
        let interfaces = classpath.interface_closure(roots.iter());
        collect_methods(chain.iter().chain(interfaces.iter()))
    }

    /// Methods inherited from the superclass chain and all interfaces.
    pub fn inherited_methods(&self) -> Vec<MethodSig> {
        let chain = self.superclass_chain();
        let interfaces = self.interface_closure(&chain);
        collect_methods(chain.iter().chain(interfaces.iter()))
    }
}

fn collect_methods<'h>(hosts: impl Iterator<Item = &'h Arc<HostType>>) -> Vec<MethodSig> {
    hosts
        .flat_map(|host| {
            host.descriptor()
                .methods
                .iter()
                .map(|m| MethodSig::from_descriptor(host.name(), m))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn resolve_or_report(
    scope: &TypeScope<'_>,
    ty: &TypeName,
    diagnostics: &mut Vec<Diagnostic>,
) -> TypeRef {
    scope.resolve(ty).unwrap_or_else(|d| {
        diagnostics.push(d);
        TypeRef::object()
    })
}

/// Collect the class's supertypes and members, reporting declaration errors.
pub(crate) fn declare(
    decl: &ClassDecl,
    scope: &TypeScope<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> ClassInfo {
    let superclass = match &decl.superclass {
        Some(written) => check_superclass(decl, scope, written, diagnostics),
        None => OBJECT.to_string(),
    };
    let interfaces = check_interfaces(decl, scope, diagnostics);

    let mut info = ClassInfo {
        name: decl.name.clone(),
        superclass,
        interfaces,
        fields: Vec::new(),
        methods: Vec::new(),
        constructors: Vec::new(),
        instance_count: 0,
        static_count: 0,
    };

    for member in &decl.members {
        match member {
            Member::Field(field) => {
                if info.fields.iter().any(|f| f.name == field.name) {
                    diagnostics.push(Diagnostic::new(
                        format!(
                            "variable {} is already defined in class {}",
                            field.name, decl.name
                        ),
                        field.span,
                    ));
                }
                let counter = if field.modifiers.is_static {
                    &mut info.static_count
                } else {
                    &mut info.instance_count
                };
                let slot = *counter;
                *counter += 1;
                info.fields.push(FieldInfo {
                    name: field.name.clone(),
                    ty: resolve_or_report(scope, &field.ty, diagnostics),
                    visibility: field.modifiers.visibility(),
                    is_static: field.modifiers.is_static,
                    is_final: field.modifiers.is_final,
                    slot,
                });
            }
            Member::Method(method) => {
                if method.modifiers.is_static {
                    diagnostics.push(Diagnostic::new(
                        format!("static method {} is not supported", method.name),
                        method.span,
                    ));
                }
                let sig = MethodSig {
                    name: method.name.clone(),
                    params: method
                        .params
                        .iter()
                        .map(|p| resolve_or_report(scope, &p.ty, diagnostics))
                        .collect(),
                    return_type: match &method.return_type {
                        Some(ty) => resolve_or_report(scope, ty, diagnostics),
                        None => TypeRef::Void,
                    },
                    throws: method
                        .throws
                        .iter()
                        .map(|t| resolve_or_report(scope, t, diagnostics).canonical_name())
                        .collect(),
                    visibility: method.modifiers.visibility(),
                    is_abstract: false,
                    is_static: method.modifiers.is_static,
                    owner: decl.name.clone(),
                };
                if info.methods.iter().any(|m| m.same_parameters(&sig)) {
                    diagnostics.push(Diagnostic::new(
                        format!(
                            "method {} is already defined in class {}",
                            sig.signature(),
                            decl.name
                        ),
                        method.span,
                    ));
                }
                info.methods.push(sig);
            }
            Member::Constructor(ctor) => {
                if ctor.modifiers.is_static {
                    diagnostics.push(Diagnostic::new(
                        "modifier static not allowed here",
                        ctor.span,
                    ));
                }
                let params: Vec<TypeRef> = ctor
                    .params
                    .iter()
                    .map(|p| resolve_or_report(scope, &p.ty, diagnostics))
                    .collect();
                if info.constructors.contains(&params) {
                    let names: Vec<String> = params.iter().map(TypeRef::simple_name).collect();
                    diagnostics.push(Diagnostic::new(
                        format!(
                            "constructor {}({}) is already defined in class {}",
                            decl.name,
                            names.join(","),
                            decl.name
                        ),
                        ctor.span,
                    ));
                }
                info.constructors.push(params);
            }
        }
    }
    info
}

fn check_superclass(
    decl: &ClassDecl,
    scope: &TypeScope<'_>,
    written: &TypeName,
    diagnostics: &mut Vec<Diagnostic>,
) -> String {
    let error = |message: String| Diagnostic::new(message, written.span);
    let name = match scope.resolve(written) {
        Ok(TypeRef::Named(name)) => name,
        Ok(other) => {
            diagnostics.push(error(format!("unexpected type {} in extends clause", other)));
            return OBJECT.to_string();
        }
        Err(d) => {
            diagnostics.push(d);
            return OBJECT.to_string();
        }
    };
    if name == decl.name {
        diagnostics.push(error(format!("cyclic inheritance involving {}", name)));
        return OBJECT.to_string();
    }
    if BUILTIN_TYPES.contains(&name.as_str()) {
        if !is_object(&name) {
            diagnostics.push(error(format!("cannot inherit from final {}", name)));
            return OBJECT.to_string();
        }
        return name;
    }
    if let Some(descriptor) = scope.classpath().descriptor(&name) {
        if !descriptor.is_class() {
            diagnostics.push(error(format!("no interface expected here: {}", name)));
        } else if !descriptor.has_default_constructor() {
            diagnostics.push(error(format!(
                "no default constructor available in {}",
                name
            )));
        }
    }
    name
}

fn check_interfaces(
    decl: &ClassDecl,
    scope: &TypeScope<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut interfaces = Vec::new();
    for written in &decl.interfaces {
        let name = match scope.resolve(written) {
            Ok(TypeRef::Named(name)) => name,
            Ok(other) => {
                diagnostics.push(Diagnostic::new(
                    format!("interface expected here: {}", other),
                    written.span,
                ));
                continue;
            }
            Err(d) => {
                diagnostics.push(d);
                continue;
            }
        };
        let is_interface = scope
            .classpath()
            .descriptor(&name)
            .is_some_and(|d| d.is_interface());
        if !is_interface {
            diagnostics.push(Diagnostic::new(
                format!("interface expected here: {}", name),
                written.span,
            ));
            continue;
        }
        if !seen.insert(name.clone()) {
            diagnostics.push(Diagnostic::new(
                format!("repeated interface {}", name),
                written.span,
            ));
            continue;
        }
        interfaces.push(name);
    }
    interfaces
}

fn visibility_rank(visibility: Visibility) -> u8 {
    match visibility {
        Visibility::Private => 0,
        Visibility::Package => 1,
        Visibility::Protected => 2,
        Visibility::Public => 3,
    }
}

/// Check overrides and that every inherited abstract method is implemented.
pub(crate) fn check_inheritance(
    ctx: &ClassContext<'_>,
    decl: &ClassDecl,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let inherited = ctx.inherited_methods();
    let method_spans: Vec<Span> = decl
        .members
        .iter()
        .filter_map(|m| match m {
            Member::Method(method) => Some(method.span),
            _ => None,
        })
        .collect();

    for (own, span) in ctx.info.methods.iter().zip(method_spans) {
        for parent in inherited.iter().filter(|p| p.same_parameters(own)) {
            if parent.visibility == Visibility::Private {
                continue;
            }
            let compatible = match (&own.return_type, &parent.return_type) {
                (a, b) if a == b => true,
                (TypeRef::Named(a), TypeRef::Named(b)) => ctx.is_subtype(a, b),
                _ => false,
            };
            if !compatible {
                diagnostics.push(Diagnostic::new(
                    format!(
                        "{} in {} cannot override {} in {}; return type {} is not compatible with {}",
                        own.signature(),
                        ctx.info.name,
                        parent.signature(),
                        parent.owner,
                        own.return_type,
                        parent.return_type
                    ),
                    span,
                ));
            }
            if visibility_rank(own.visibility) < visibility_rank(parent.visibility) {
                diagnostics.push(Diagnostic::new(
                    format!(
                        "{} in {} cannot override {} in {}; attempting to assign weaker access privileges",
                        own.signature(),
                        ctx.info.name,
                        parent.signature(),
                        parent.owner
                    ),
                    span,
                ));
            }
        }
    }

    let mut reported = FxHashSet::default();
    for missing in inherited.iter().filter(|m| m.is_abstract) {
        let implemented = ctx.info.methods.iter().any(|m| m.same_parameters(missing))
            || inherited
                .iter()
                .any(|m| !m.is_abstract && m.same_parameters(missing));
        if !implemented && reported.insert(missing.signature()) {
            diagnostics.push(Diagnostic::new(
                format!(
                    "{} is not abstract and does not override abstract method {} in {}",
                    ctx.info.name,
                    missing.signature(),
                    missing.owner
                ),
                decl.span,
            ));
        }
    }
}
