//! Runtime for compiled units: values, loaded classes, instances, reflective
//! field handles and the interpreter that executes method bodies.

mod builtins;
mod class;
mod field;
mod interpreter;
mod object;
mod value;

pub use class::{Artifact, GeneratedClass};
pub use field::{AccessGuard, Field};
pub use object::Object;
pub use value::Value;
