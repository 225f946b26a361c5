//! Subcommand implementations.

pub mod check;
pub mod compile;
pub mod synth;

use anyhow::Context;
use morph_engine::{GeneratorConfig, TypeDescriptor};
use std::path::Path;

/// Read a JSON contract descriptor.
pub fn load_contract(path: &Path) -> anyhow::Result<TypeDescriptor> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read contract {}", path.display()))?;
    TypeDescriptor::from_json(&json)
        .with_context(|| format!("invalid contract descriptor {}", path.display()))
}

/// The config file if one was given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<GeneratorConfig> {
    match path {
        Some(path) => GeneratorConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(GeneratorConfig::default()),
    }
}
