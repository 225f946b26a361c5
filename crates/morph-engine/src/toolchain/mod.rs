//! Compiler and loader collaborators used by the generator.

pub mod compiler;
pub mod loader;

pub use compiler::{CommandCompiler, CompileOutcome, Compiler, ScriptCompiler, EXPORTED_TYPES_DIR};
pub use loader::{Loader, UnitLoader};
