//! Morph Engine
//!
//! Runtime class synthesis: implementations of arbitrary contracts are
//! generated from a few caller-supplied hooks, compiled, loaded and cached.
//!
//! - **Descriptors**: the contracts (`descriptor` module)
//! - **Synthesis**: hooks and the class source writer (`synth` module)
//! - **Script**: the class source language front end (`script` module)
//! - **Toolchain**: compiler and loader collaborators (`toolchain` module)
//! - **VM**: loaded classes, instances and the interpreter (`vm` module)
//! - **Generator**: the caching engine (`generator` module)
//! - **Proxy**: delegating proxies built on the engine (`proxy` module)
//!
//! # Example
//!
//! ```rust,ignore
//! use morph_engine::{DelegatingProxyBuilder, MethodDescriptor, TypeDescriptor, TypeRef, Value};
//! use std::sync::Arc;
//!
//! let greeter = TypeDescriptor::interface("demo.Greeter").method(
//!     MethodDescriptor::new("greet")
//!         .param(TypeRef::string())
//!         .returns(TypeRef::string()),
//! );
//!
//! let builder = DelegatingProxyBuilder::new();
//! let proxy = builder.augment(
//!     &greeter,
//!     Arc::new(|_: &TypeDescriptor, _: &MethodDescriptor, args: &[Value]| {
//!         Ok(Value::from(format!("Hello {}", args[0])))
//!     }),
//! )?;
//! assert_eq!(proxy.invoke("greet", &[Value::from("World")])?, Value::from("Hello World"));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

pub mod classpath;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod proxy;
pub mod script;
pub mod synth;
pub mod toolchain;
pub mod vm;

// ============================================================================
// Re-exports
// ============================================================================

pub use classpath::{ClassPath, HostType, NativeMethod};
pub use config::{CompilerConfig, ConfigError, GeneratorConfig};
pub use descriptor::{
    ConstructorDescriptor, MethodDescriptor, PrimitiveKind, TypeDescriptor, TypeKind, TypeRef,
    Visibility,
};
pub use error::{MorphError, MorphResult};
pub use generator::ClassGenerator;
pub use proxy::{CallHandler, DelegatingHooks, DelegatingProxyBuilder};
pub use synth::{class_name_for, ClosureHooks, SourceUnit, StubHooks, SynthesisHooks};
pub use toolchain::{CommandCompiler, CompileOutcome, Compiler, Loader, ScriptCompiler, UnitLoader};
pub use vm::{AccessGuard, Artifact, Field, GeneratedClass, Object, Value};
