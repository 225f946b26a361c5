//! Generator configuration (`morph.toml`).
//!
//! ```toml
//! temp_prefix = "rtc"
//! work_dir = "/var/tmp/morph"
//! classpath = ["types"]
//! max_call_depth = 256
//!
//! [compiler]
//! kind = "command"
//! program = "morph"
//! args = ["compile"]
//! ```

use crate::classpath::ClassPath;
use crate::error::MorphResult;
use crate::toolchain::{CommandCompiler, Compiler, ScriptCompiler};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Default prefix for per-generation temporary directories.
pub const DEFAULT_TEMP_PREFIX: &str = "rtc";

/// Default interpreter call-depth limit.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Which compiler collaborator the engine uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CompilerConfig {
    /// The in-process class source compiler
    #[default]
    Script,
    /// An external compiler process
    Command {
        /// Executable to run
        program: String,
        /// Arguments placed before `-cp <classpath> <source>`
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Settings for a [`ClassGenerator`](crate::ClassGenerator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Prefix for temporary directories holding synthesized sources
    pub temp_prefix: String,
    /// Parent directory for temporary directories (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
    /// Directories of `*.json` type descriptors added to the classpath
    pub classpath: Vec<PathBuf>,
    /// Compiler collaborator
    pub compiler: CompilerConfig,
    /// Maximum nested call depth in generated code
    pub max_call_depth: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            work_dir: None,
            classpath: Vec::new(),
            compiler: CompilerConfig::Script,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl GeneratorConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;

        // Relative paths are relative to the config file
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temp_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "temp_prefix cannot be empty".to_string(),
            ));
        }
        if self.temp_prefix.contains(['/', '\\']) {
            return Err(ConfigError::ValidationError(format!(
                "temp_prefix '{}' must not contain path separators",
                self.temp_prefix
            )));
        }
        if self.max_call_depth == 0 {
            return Err(ConfigError::ValidationError(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        if let CompilerConfig::Command { program, .. } = &self.compiler {
            if program.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "compiler.program cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn rebase(&mut self, base: &Path) {
        for entry in &mut self.classpath {
            if entry.is_relative() {
                *entry = base.join(&*entry);
            }
        }
        if let Some(work_dir) = &mut self.work_dir {
            if work_dir.is_relative() {
                *work_dir = base.join(&*work_dir);
            }
        }
    }

    /// Instantiate the configured compiler collaborator.
    pub fn build_compiler(&self) -> Arc<dyn Compiler> {
        match &self.compiler {
            CompilerConfig::Script => Arc::new(ScriptCompiler::new()),
            CompilerConfig::Command { program, args } => {
                Arc::new(CommandCompiler::new(program.clone()).args(args.iter().cloned()))
            }
        }
    }

    /// A classpath with the configured entries, their descriptors loaded.
    pub fn build_classpath(&self) -> MorphResult<ClassPath> {
        let classpath = self
            .classpath
            .iter()
            .fold(ClassPath::new(), |cp, entry| cp.with_entry(entry));
        classpath.load_entries()?;
        Ok(classpath)
    }
}
