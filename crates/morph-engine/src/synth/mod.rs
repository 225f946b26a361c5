//! Source synthesis: hooks, naming and the class writer.

pub mod hooks;
pub mod naming;
pub mod writer;

pub use hooks::{ClosureHooks, StubHooks, SynthesisHooks};
pub use naming::class_name_for;
pub use writer::{synthesize, SourceUnit};
