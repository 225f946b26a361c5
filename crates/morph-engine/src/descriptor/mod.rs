//! Type and method metadata.
//!
//! Descriptors are plain data supplied by the caller. They describe the
//! contracts the engine implements and the host types generated code links
//! against.

pub mod contract;
pub mod method;
pub mod types;

pub use contract::{TypeDescriptor, TypeKind};
pub use method::{ConstructorDescriptor, MethodDescriptor, Visibility};
pub use types::{PrimitiveKind, TypeRef};
