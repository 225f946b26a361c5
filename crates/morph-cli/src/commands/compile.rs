//! `morph compile`: compile one class source file.

use super::load_config;
use anyhow::Context;
use morph_engine::{ClassPath, Compiler, ScriptCompiler};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub fn execute(source: &Path, classpath: &[OsString], config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let entries = config
        .classpath
        .iter()
        .cloned()
        .chain(split_classpath(classpath));
    let classpath = entries.fold(ClassPath::new(), |cp, entry| cp.with_entry(entry));
    let loaded = classpath
        .load_entries()
        .context("failed to load classpath entries")?;
    tracing::debug!(types = loaded, source = %source.display(), "compiling");

    let outcome = ScriptCompiler::new()
        .compile(&classpath, source)
        .with_context(|| format!("failed to compile {}", source.display()))?;
    if !outcome.success {
        for diagnostic in &outcome.diagnostics {
            eprintln!("{}", diagnostic);
        }
        anyhow::bail!(
            "{} had {} error(s)",
            source.display(),
            outcome.diagnostics.len()
        );
    }
    Ok(())
}

/// Every `-cp` value split on the platform path separator.
fn split_classpath(values: &[OsString]) -> Vec<PathBuf> {
    values
        .iter()
        .flat_map(std::env::split_paths)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}
