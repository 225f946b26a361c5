//! The class source language.
//!
//! Synthesized units are written in a small Java-flavoured language: one
//! class per unit, fields, constructors and methods with statement bodies.
//! [`compile_source`] runs the whole front end (lexer, parser, checker) and
//! yields the [`CompiledClass`] that the loader links.

pub mod ast;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod unit;

pub use compiler::{compile_unit, Diagnostic};
pub use unit::CompiledClass;

use crate::classpath::ClassPath;
use parser::Parser;

/// File extension of source units.
pub const SOURCE_EXTENSION: &str = "morph";

/// Compile source text against a classpath.
///
/// On failure returns every problem found, formatted with source context.
pub fn compile_source(source: &str, classpath: &ClassPath) -> Result<CompiledClass, Vec<String>> {
    let parser = Parser::new(source).map_err(|errors| {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
    })?;
    let unit = parser.parse().map_err(|errors| {
        errors
            .iter()
            .map(|e| match &e.suggestion {
                Some(hint) => format!("{}\n  = help: {}", e, hint),
                None => e.to_string(),
            })
            .collect::<Vec<_>>()
    })?;
    compile_unit(&unit, classpath).map_err(|diagnostics| {
        diagnostics
            .iter()
            .map(|d| d.format_with_source(source))
            .collect()
    })
}
