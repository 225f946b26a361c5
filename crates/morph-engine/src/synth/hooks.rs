//! Synthesis hooks: the caller-specific pieces of a generated class.

use crate::descriptor::{ConstructorDescriptor, MethodDescriptor, TypeDescriptor};

/// Callbacks a concrete generator supplies.
///
/// Every hook has an empty default, so an implementation only overrides what
/// it needs. Hooks must be deterministic for a given contract: their output
/// is generated once and cached.
pub trait SynthesisHooks: Send + Sync {
    /// Qualified names to import.
    fn imports(&self, _contract: &TypeDescriptor) -> Vec<String> {
        Vec::new()
    }

    /// Superclass for interface contracts. Never consulted for class contracts.
    fn superclass(&self, _contract: &TypeDescriptor) -> Option<TypeDescriptor> {
        None
    }

    /// Extra interfaces to implement.
    fn interfaces(&self, _contract: &TypeDescriptor) -> Vec<TypeDescriptor> {
        Vec::new()
    }

    /// Member declarations placed at the top of the class body.
    fn class_body(&self, _contract: &TypeDescriptor) -> Option<String> {
        None
    }

    /// Body of the no-argument constructor; `None` omits the constructor.
    fn constructor_body(
        &self,
        _contract: &TypeDescriptor,
        _constructors: &[ConstructorDescriptor],
    ) -> Option<String> {
        None
    }

    /// Body of the synthesized implementation of `method`.
    ///
    /// Parameters are available as `par0`, `par1`, ...
    fn method_body(&self, _contract: &TypeDescriptor, _method: &MethodDescriptor) -> Option<String> {
        None
    }
}

impl<H: SynthesisHooks + ?Sized> SynthesisHooks for std::sync::Arc<H> {
    fn imports(&self, contract: &TypeDescriptor) -> Vec<String> {
        (**self).imports(contract)
    }

    fn superclass(&self, contract: &TypeDescriptor) -> Option<TypeDescriptor> {
        (**self).superclass(contract)
    }

    fn interfaces(&self, contract: &TypeDescriptor) -> Vec<TypeDescriptor> {
        (**self).interfaces(contract)
    }

    fn class_body(&self, contract: &TypeDescriptor) -> Option<String> {
        (**self).class_body(contract)
    }

    fn constructor_body(
        &self,
        contract: &TypeDescriptor,
        constructors: &[ConstructorDescriptor],
    ) -> Option<String> {
        (**self).constructor_body(contract, constructors)
    }

    fn method_body(&self, contract: &TypeDescriptor, method: &MethodDescriptor) -> Option<String> {
        (**self).method_body(contract, method)
    }
}

type ImportsFn = Box<dyn Fn(&TypeDescriptor) -> Vec<String> + Send + Sync>;
type SuperclassFn = Box<dyn Fn(&TypeDescriptor) -> Option<TypeDescriptor> + Send + Sync>;
type InterfacesFn = Box<dyn Fn(&TypeDescriptor) -> Vec<TypeDescriptor> + Send + Sync>;
type ClassBodyFn = Box<dyn Fn(&TypeDescriptor) -> Option<String> + Send + Sync>;
type ConstructorBodyFn =
    Box<dyn Fn(&TypeDescriptor, &[ConstructorDescriptor]) -> Option<String> + Send + Sync>;
type MethodBodyFn = Box<dyn Fn(&TypeDescriptor, &MethodDescriptor) -> Option<String> + Send + Sync>;

/// Hooks assembled from closures.
///
/// ```ignore
/// let hooks = ClosureHooks::new()
///     .with_method_body(|_, m| Some(format!("return \"{}\";", m.name)));
/// ```
#[derive(Default)]
pub struct ClosureHooks {
    imports: Option<ImportsFn>,
    superclass: Option<SuperclassFn>,
    interfaces: Option<InterfacesFn>,
    class_body: Option<ClassBodyFn>,
    constructor_body: Option<ConstructorBodyFn>,
    method_body: Option<MethodBodyFn>,
}

impl ClosureHooks {
    /// Hooks that contribute nothing until configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [`SynthesisHooks::imports`] callback.
    pub fn with_imports<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Vec<String> + Send + Sync + 'static,
    {
        self.imports = Some(Box::new(f));
        self
    }

    /// Set the [`SynthesisHooks::superclass`] callback.
    pub fn with_superclass<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<TypeDescriptor> + Send + Sync + 'static,
    {
        self.superclass = Some(Box::new(f));
        self
    }

    /// Set the [`SynthesisHooks::interfaces`] callback.
    pub fn with_interfaces<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Vec<TypeDescriptor> + Send + Sync + 'static,
    {
        self.interfaces = Some(Box::new(f));
        self
    }

    /// Set the [`SynthesisHooks::class_body`] callback.
    pub fn with_class_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<String> + Send + Sync + 'static,
    {
        self.class_body = Some(Box::new(f));
        self
    }

    /// Set the [`SynthesisHooks::constructor_body`] callback.
    pub fn with_constructor_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor, &[ConstructorDescriptor]) -> Option<String> + Send + Sync + 'static,
    {
        self.constructor_body = Some(Box::new(f));
        self
    }

    /// Set the [`SynthesisHooks::method_body`] callback.
    pub fn with_method_body<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeDescriptor, &MethodDescriptor) -> Option<String> + Send + Sync + 'static,
    {
        self.method_body = Some(Box::new(f));
        self
    }
}

impl SynthesisHooks for ClosureHooks {
    fn imports(&self, contract: &TypeDescriptor) -> Vec<String> {
        self.imports.as_ref().map(|f| f(contract)).unwrap_or_default()
    }

    fn superclass(&self, contract: &TypeDescriptor) -> Option<TypeDescriptor> {
        self.superclass.as_ref().and_then(|f| f(contract))
    }

    fn interfaces(&self, contract: &TypeDescriptor) -> Vec<TypeDescriptor> {
        self.interfaces.as_ref().map(|f| f(contract)).unwrap_or_default()
    }

    fn class_body(&self, contract: &TypeDescriptor) -> Option<String> {
        self.class_body.as_ref().and_then(|f| f(contract))
    }

    fn constructor_body(
        &self,
        contract: &TypeDescriptor,
        constructors: &[ConstructorDescriptor],
    ) -> Option<String> {
        self.constructor_body
            .as_ref()
            .and_then(|f| f(contract, constructors))
    }

    fn method_body(&self, contract: &TypeDescriptor, method: &MethodDescriptor) -> Option<String> {
        self.method_body.as_ref().and_then(|f| f(contract, method))
    }
}

/// Hooks whose methods all throw a "not implemented" message.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubHooks;

impl SynthesisHooks for StubHooks {
    fn method_body(&self, contract: &TypeDescriptor, method: &MethodDescriptor) -> Option<String> {
        Some(format!(
            "throw \"{}.{} is not implemented\";",
            contract.name, method.name
        ))
    }
}
