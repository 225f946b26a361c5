//! Compiler collaborators.
//!
//! A compiler turns one synthesized source file into a compiled unit written
//! next to it (`<Class>.unit.json`). Failure to compile is reported through
//! [`CompileOutcome`], not as an error; errors are reserved for the
//! collaborator itself breaking (unreadable source, process spawn failure).

use crate::classpath::ClassPath;
use crate::error::MorphResult;
use crate::script::{compile_source, unit::unit_path};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Directory, beside the source, that receives exported descriptors for
/// external compilers.
pub const EXPORTED_TYPES_DIR: &str = ".types";

/// Result of one compilation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutcome {
    /// Whether a unit was produced
    pub success: bool,
    /// Diagnostics, one message per entry
    pub diagnostics: Vec<String>,
}

impl CompileOutcome {
    /// A successful compilation without diagnostics.
    pub fn succeeded() -> Self {
        Self {
            success: true,
            diagnostics: Vec::new(),
        }
    }

    /// A failed compilation with its diagnostics.
    pub fn failed(diagnostics: Vec<String>) -> Self {
        Self {
            success: false,
            diagnostics,
        }
    }
}

/// Compiles a source file against a classpath.
pub trait Compiler: Send + Sync {
    /// Compile `source`, writing the unit into the source's directory.
    fn compile(&self, classpath: &ClassPath, source: &Path) -> MorphResult<CompileOutcome>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "custom"
    }
}

/// The in-process class source compiler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptCompiler;

impl ScriptCompiler {
    /// The in-process compiler.
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for ScriptCompiler {
    fn name(&self) -> &str {
        "script"
    }

    fn compile(&self, classpath: &ClassPath, source: &Path) -> MorphResult<CompileOutcome> {
        let text = std::fs::read_to_string(source)?;
        let unit = match compile_source(&text, classpath) {
            Ok(unit) => unit,
            Err(diagnostics) => return Ok(CompileOutcome::failed(diagnostics)),
        };
        let json = match unit.to_json() {
            Ok(json) => json,
            Err(e) => return Ok(CompileOutcome::failed(vec![e.to_string()])),
        };
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        std::fs::write(unit_path(dir, &unit.name), json)?;
        Ok(CompileOutcome::succeeded())
    }
}

/// An external compiler process.
///
/// Runs `<program> [args] -cp <classpath> <source>`. In-memory classpath
/// types are exported to a `.types` directory beside the source first and
/// that directory is prepended to the classpath argument. A non-zero exit
/// status is a failed compilation; its stderr and stdout lines become the
/// diagnostics.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandCompiler {
    /// Run `program` with no extra arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before `-cp`.
    pub fn args(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.args.extend(args);
        self
    }

    /// The program run for each compilation.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn classpath_arg(&self, classpath: &ClassPath, exported: &Path) -> String {
        let entries = classpath.to_arg();
        if entries.is_empty() {
            exported.display().to_string()
        } else {
            format!(
                "{}{}{}",
                exported.display(),
                crate::classpath::PATH_SEPARATOR,
                entries
            )
        }
    }
}

impl Compiler for CommandCompiler {
    fn name(&self) -> &str {
        "command"
    }

    fn compile(&self, classpath: &ClassPath, source: &Path) -> MorphResult<CompileOutcome> {
        let dir = source.parent().unwrap_or_else(|| Path::new("."));
        let exported = dir.join(EXPORTED_TYPES_DIR);
        classpath.export(&exported)?;

        tracing::debug!(program = %self.program.display(), source = %source.display(), "spawning compiler");
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg("-cp")
            .arg(self.classpath_arg(classpath, &exported))
            .arg(source)
            .current_dir(dir)
            .output()?;

        if output.status.success() {
            return Ok(CompileOutcome::succeeded());
        }
        let mut diagnostics: Vec<String> = String::from_utf8_lossy(&output.stderr)
            .lines()
            .chain(String::from_utf8_lossy(&output.stdout).lines())
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        if diagnostics.is_empty() {
            diagnostics.push(format!(
                "{} exited with {}",
                self.program.display(),
                output.status
            ));
        }
        Ok(CompileOutcome::failed(diagnostics))
    }
}
