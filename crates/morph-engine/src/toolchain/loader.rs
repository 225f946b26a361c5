//! Loader collaborators.

use crate::classpath::ClassPath;
use crate::error::{MorphError, MorphResult};
use crate::script::unit::{unit_path, CompiledClass, UNIT_FORMAT_VERSION};
use crate::vm::{Artifact, GeneratedClass};
use std::path::Path;

/// Resolves a compiled class by name from a compiled-output location.
pub trait Loader: Send + Sync {
    /// Load `class_name` from `output_dir`, linking it against `classpath`.
    fn load(&self, classpath: &ClassPath, output_dir: &Path, class_name: &str) -> MorphResult<Artifact>;
}

/// Loads `<Class>.unit.json` files and links them.
#[derive(Debug, Clone, Copy)]
pub struct UnitLoader {
    max_call_depth: usize,
}

impl UnitLoader {
    /// A loader whose classes stop runaway recursion at `max_call_depth` frames.
    pub fn new(max_call_depth: usize) -> Self {
        Self { max_call_depth }
    }
}

impl Default for UnitLoader {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_MAX_CALL_DEPTH)
    }
}

impl Loader for UnitLoader {
    fn load(&self, classpath: &ClassPath, output_dir: &Path, class_name: &str) -> MorphResult<Artifact> {
        let path = unit_path(output_dir, class_name);
        // Read fully so no handle outlives the temporary directory
        let json = std::fs::read_to_string(&path).map_err(|e| {
            MorphError::load(class_name, format!("cannot read {}: {}", path.display(), e))
        })?;
        let unit = CompiledClass::from_json(&json)
            .map_err(|e| MorphError::load(class_name, format!("malformed unit: {}", e)))?;

        if unit.format_version != UNIT_FORMAT_VERSION {
            return Err(MorphError::load(
                class_name,
                format!(
                    "unit format {} is not supported (expected {})",
                    unit.format_version, UNIT_FORMAT_VERSION
                ),
            ));
        }
        if unit.name != class_name {
            return Err(MorphError::load(
                class_name,
                format!("unit declares class {}", unit.name),
            ));
        }

        tracing::debug!(class = class_name, path = %path.display(), "linking unit");
        GeneratedClass::link(unit, classpath, self.max_call_depth)
    }
}
