//! Shared fixtures for the end-to-end tests.

#![allow(dead_code)]

pub use morph_engine::*;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// Contracts
// ============================================================================

/// `demo.Greeter { String greet(String) }`
pub fn greeter() -> TypeDescriptor {
    TypeDescriptor::interface("demo.Greeter").method(
        MethodDescriptor::new("greet")
            .param(TypeRef::string())
            .returns(TypeRef::string()),
    )
}

/// `demo.Calc { int m1(int, int); void m2() }`
pub fn calc() -> TypeDescriptor {
    TypeDescriptor::interface("demo.Calc").methods([
        MethodDescriptor::new("m1")
            .params([TypeRef::int(), TypeRef::int()])
            .returns(TypeRef::int()),
        MethodDescriptor::new("m2"),
    ])
}

/// Interface without methods.
pub fn marker(name: &str) -> TypeDescriptor {
    TypeDescriptor::interface(name)
}

// ============================================================================
// Hooks
// ============================================================================

/// Hooks answering every method with the same body.
pub fn body_hooks(body: &str) -> ClosureHooks {
    let body = body.to_string();
    ClosureHooks::new().with_method_body(move |_, _| Some(body.clone()))
}

/// Hooks with a class body fragment and per-method bodies by name.
pub fn class_hooks(class_body: &str, bodies: &[(&str, &str)]) -> ClosureHooks {
    let class_body = class_body.to_string();
    let bodies: Vec<(String, String)> = bodies
        .iter()
        .map(|(m, b)| (m.to_string(), b.to_string()))
        .collect();
    ClosureHooks::new()
        .with_class_body(move |_| Some(class_body.clone()))
        .with_method_body(move |_, method| {
            bodies
                .iter()
                .find(|(name, _)| *name == method.name)
                .map(|(_, body)| body.clone())
        })
}

// ============================================================================
// Compiler doubles
// ============================================================================

/// The script compiler, counting its invocations.
#[derive(Default)]
pub struct CountingCompiler {
    calls: AtomicUsize,
}

impl CountingCompiler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Compiler for CountingCompiler {
    fn compile(&self, classpath: &ClassPath, source: &Path) -> MorphResult<CompileOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ScriptCompiler::new().compile(classpath, source)
    }
}

/// A compiler that always fails, counting its invocations.
#[derive(Default)]
pub struct FailingCompiler {
    calls: AtomicUsize,
}

impl FailingCompiler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Compiler for FailingCompiler {
    fn compile(&self, _: &ClassPath, source: &Path) -> MorphResult<CompileOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(CompileOutcome::failed(vec![format!(
            "{}: refusing to compile",
            source.display()
        )]))
    }
}

/// A generator whose compiler is a [`CountingCompiler`].
pub fn counting_generator<H: SynthesisHooks>(hooks: H) -> (ClassGenerator<H>, Arc<CountingCompiler>) {
    let compiler = Arc::new(CountingCompiler::default());
    let generator = ClassGenerator::new(hooks).with_compiler(compiler.clone());
    (generator, compiler)
}

// ============================================================================
// Handlers
// ============================================================================

/// One observed handler call.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub iface: TypeDescriptor,
    pub method: MethodDescriptor,
    pub args: Vec<Value>,
}

/// Records every call and answers with a fixed function of the call.
pub struct RecordingHandler {
    calls: Mutex<Vec<Call>>,
    answer: Box<dyn Fn(&MethodDescriptor, &[Value]) -> MorphResult<Value> + Send + Sync>,
}

impl RecordingHandler {
    pub fn new<F>(answer: F) -> Arc<Self>
    where
        F: Fn(&MethodDescriptor, &[Value]) -> MorphResult<Value> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            answer: Box::new(answer),
        })
    }

    /// Answers `Null` to everything.
    pub fn silent() -> Arc<Self> {
        Self::new(|_, _| Ok(Value::Null))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }
}

impl CallHandler for RecordingHandler {
    fn call(&self, iface: &TypeDescriptor, method: &MethodDescriptor, args: &[Value]) -> MorphResult<Value> {
        self.calls.lock().push(Call {
            iface: iface.clone(),
            method: method.clone(),
            args: args.to_vec(),
        });
        (self.answer)(method, args)
    }
}

// ============================================================================
// Expectations
// ============================================================================

/// Invoke `method` and assert the result.
pub fn expect_invoke(object: &Object, method: &str, args: &[Value], expected: impl Into<Value>) {
    let expected = expected.into();
    match object.invoke(method, args) {
        Ok(value) => assert_eq!(value, expected, "{}({:?})", method, args),
        Err(e) => panic!("{}({:?}) failed: {}", method, args, e),
    }
}

/// Unwrap the error of a result that must fail.
pub fn expect_err<T: std::fmt::Debug>(result: MorphResult<T>) -> MorphError {
    match result {
        Ok(value) => panic!("expected an error, got {:?}", value),
        Err(e) => e,
    }
}

/// Unwrap the diagnostics of a failed compilation.
pub fn expect_compilation_error<T: std::fmt::Debug>(result: MorphResult<T>) -> Vec<String> {
    match expect_err(result) {
        MorphError::Compilation { diagnostics, .. } => diagnostics,
        other => panic!("expected a compilation error, got {}", other),
    }
}

/// Instantiate a contract with `hooks` on a fresh generator.
pub fn instance_with<H: SynthesisHooks>(hooks: H, contract: &TypeDescriptor) -> Object {
    ClassGenerator::new(hooks)
        .new_instance(contract)
        .unwrap_or_else(|e| panic!("generating {} failed: {}", contract.name, e))
}
