//! Engine error types.

use crate::config::ConfigError;
use crate::vm::Value;

/// Result alias used throughout the engine.
pub type MorphResult<T> = Result<T, MorphError>;

/// Errors that can occur while generating, loading, instantiating or running
/// synthesized classes.
#[derive(Debug, thiserror::Error)]
pub enum MorphError {
    /// The requested type cannot be used as a contract here
    #[error("Invalid contract '{name}': {reason}")]
    InvalidContract {
        /// Contract name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Hooks nominated an impossible superclass or interface
    #[error("Invalid hierarchy for '{name}': {reason}")]
    InvalidHierarchy {
        /// Contract name
        name: String,
        /// What was wrong with the nomination
        reason: String,
    },

    /// The compiler collaborator reported a failure
    #[error("Compilation of {class} failed:\n{}", .diagnostics.join("\n"))]
    Compilation {
        /// Generated class name
        class: String,
        /// Compiler diagnostics, one per line
        diagnostics: Vec<String>,
    },

    /// The compiled artifact could not be resolved or linked
    #[error("Could not load {class}: {reason}")]
    Load {
        /// Generated class name
        class: String,
        /// Loader failure
        reason: String,
    },

    /// Running the no-argument constructor failed
    #[error("Could not instantiate {class}: {reason}")]
    Instantiation {
        /// Generated class name
        class: String,
        /// Constructor failure
        reason: String,
    },

    /// A value could not be cast or returned as the declared type
    #[error("Invalid result type: expected {expected}, found {found}")]
    InvalidResultType {
        /// Declared type
        expected: String,
        /// Runtime kind of the offending value
        found: String,
    },

    /// An expected synthesized field was missing during two-phase construction
    #[error("Patching {class} failed: field '{field}' {reason}")]
    Patching {
        /// Generated class name
        class: String,
        /// Field that could not be patched
        field: String,
        /// Failure detail
        reason: String,
    },

    /// No method with a matching name and arity exists
    #[error("No such method: {class}.{method}")]
    NoSuchMethod {
        /// Receiver class
        class: String,
        /// Method name and arity
        method: String,
    },

    /// The method is declared but has no implementation
    #[error("Abstract method invoked: {class}.{method}")]
    AbstractMethod {
        /// Receiver class
        class: String,
        /// Method name and arity
        method: String,
    },

    /// Reflective lookup of an unknown field
    #[error("No such field: {class}.{field}")]
    NoSuchField {
        /// Declaring class
        class: String,
        /// Field name
        field: String,
    },

    /// Reflective access to a non-public field without granted access
    #[error("Illegal access to {class}.{field}")]
    IllegalAccess {
        /// Declaring class
        class: String,
        /// Field name
        field: String,
    },

    /// A value does not conform to the declared parameter or field type
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// Method invoked on null
    #[error("Null reference: cannot invoke '{0}' on null")]
    NullReference(String),

    /// Integer division by zero and similar
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// A `throw` statement in generated code
    #[error("Thrown: {0}")]
    Thrown(Value),

    /// Call depth exceeded the configured limit
    #[error("Stack overflow: call depth exceeded {depth}")]
    StackOverflow {
        /// Configured limit
        depth: usize,
    },

    /// A call handler reported a failure
    #[error("Handler error: {0}")]
    Handler(String),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// File I/O error
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl MorphError {
    /// Convenience constructor for handler implementations.
    pub fn handler(message: impl Into<String>) -> Self {
        MorphError::Handler(message.into())
    }

    pub(crate) fn invalid_contract(name: &str, reason: impl Into<String>) -> Self {
        MorphError::InvalidContract {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_hierarchy(name: &str, reason: impl Into<String>) -> Self {
        MorphError::InvalidHierarchy {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn load(class: &str, reason: impl Into<String>) -> Self {
        MorphError::Load {
            class: class.to_string(),
            reason: reason.into(),
        }
    }
}
