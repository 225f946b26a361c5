//! The class generation engine.
//!
//! A [`ClassGenerator`] turns contracts into loaded classes:
//!
//! 1. synthesize source from the contract and the hooks
//! 2. write it into a fresh temporary directory
//! 3. compile it with the configured [`Compiler`]
//! 4. load the compiled unit with the [`Loader`]
//! 5. cache the artifact under the contract
//!
//! The temporary directory is removed whatever the outcome. Failed
//! generations are never cached.

use crate::classpath::ClassPath;
use crate::config::GeneratorConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{MorphError, MorphResult};
use crate::synth::{self, class_name_for, SourceUnit, SynthesisHooks};
use crate::toolchain::{Compiler, Loader, UnitLoader};
use crate::vm::{Artifact, Object};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Generates, caches and instantiates implementations of contracts.
///
/// One artifact exists per distinct [`TypeDescriptor`] for the lifetime of
/// the generator. Concurrent requests for the same unseen contract wait for a
/// single generation; requests for different contracts run independently.
pub struct ClassGenerator<H> {
    hooks: H,
    config: GeneratorConfig,
    classpath: ClassPath,
    compiler: Arc<dyn Compiler>,
    loader: Arc<dyn Loader>,
    cache: DashMap<TypeDescriptor, Arc<OnceCell<Artifact>>>,
}

impl<H: SynthesisHooks> ClassGenerator<H> {
    /// A generator with the default configuration: in-process compiler and
    /// an empty classpath.
    pub fn new(hooks: H) -> Self {
        let config = GeneratorConfig::default();
        Self {
            compiler: config.build_compiler(),
            loader: Arc::new(UnitLoader::new(config.max_call_depth)),
            classpath: ClassPath::new(),
            hooks,
            config,
            cache: DashMap::new(),
        }
    }

    /// A generator built from `config`; classpath entries are loaded now.
    pub fn with_config(hooks: H, config: GeneratorConfig) -> MorphResult<Self> {
        config.validate()?;
        let classpath = config.build_classpath()?;
        Ok(Self {
            compiler: config.build_compiler(),
            loader: Arc::new(UnitLoader::new(config.max_call_depth)),
            classpath,
            hooks,
            config,
            cache: DashMap::new(),
        })
    }

    /// Use `classpath` for compiling and linking.
    pub fn with_classpath(mut self, classpath: ClassPath) -> Self {
        self.classpath = classpath;
        self
    }

    /// Replace the compiler collaborator.
    pub fn with_compiler(mut self, compiler: Arc<dyn Compiler>) -> Self {
        self.compiler = compiler;
        self
    }

    /// Replace the loader collaborator.
    pub fn with_loader(mut self, loader: Arc<dyn Loader>) -> Self {
        self.loader = loader;
        self
    }

    /// The synthesis hooks.
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The configuration this generator was built from.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The classpath generated code compiles and links against.
    pub fn classpath(&self) -> &ClassPath {
        &self.classpath
    }

    /// The loaded implementation of `contract`, generating it on first use.
    pub fn resolve(&self, contract: &TypeDescriptor) -> MorphResult<Artifact> {
        if !contract.is_contract_kind() {
            return Err(MorphError::invalid_contract(
                &contract.name,
                format!("{} types cannot be implemented", contract.kind),
            ));
        }

        let cached = self
            .cache
            .get(contract)
            .and_then(|cell| cell.value().get().cloned());
        if let Some(artifact) = cached {
            tracing::debug!(contract = %contract.name, class = artifact.name(), "cache hit");
            return Ok(artifact);
        }

        // Clone the cell out so the shard lock is released before generating
        let cell = self
            .cache
            .entry(contract.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        match cell.get_or_try_init(|| self.generate(contract)) {
            Ok(artifact) => Ok(artifact.clone()),
            Err(e) => {
                self.cache.remove_if(contract, |_, current| {
                    Arc::ptr_eq(current, &cell) && current.get().is_none()
                });
                Err(e)
            }
        }
    }

    /// A new instance of the implementation of `contract`.
    pub fn new_instance(&self, contract: &TypeDescriptor) -> MorphResult<Object> {
        let class = self.resolve(contract)?;
        let object = class.instantiate()?;
        if !object.is_instance_of(&contract.name) {
            return Err(MorphError::Instantiation {
                class: class.name().to_string(),
                reason: format!("instance does not implement {}", contract.name),
            });
        }
        Ok(object)
    }

    /// The source that would be generated for `contract`, without compiling.
    pub fn synthesize(&self, contract: &TypeDescriptor) -> MorphResult<SourceUnit> {
        synth::synthesize(&self.hooks, contract, &class_name_for(&contract.name))
    }

    /// Whether an artifact for `contract` is cached.
    pub fn is_cached(&self, contract: &TypeDescriptor) -> bool {
        self.cache
            .get(contract)
            .is_some_and(|cell| cell.value().get().is_some())
    }

    /// Number of cached artifacts.
    pub fn cached_count(&self) -> usize {
        self.cache.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    fn generate(&self, contract: &TypeDescriptor) -> MorphResult<Artifact> {
        self.classpath.define_matching(contract)?;
        let unit = self.synthesize(contract)?;
        for nominated in &unit.nominated {
            self.classpath.define_if_absent(nominated);
        }
        tracing::trace!(class = %unit.class_name, source = %unit.text, "synthesized source");

        let dir = self.temp_dir()?;
        let result = self.compile_and_load(dir.path(), &unit, contract);
        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            tracing::warn!(dir = %path.display(), error = %e, "failed to remove temporary directory");
        }

        let artifact = result?;
        tracing::info!(
            contract = %contract.name,
            class = artifact.name(),
            methods = contract.abstract_methods().count(),
            "generated class"
        );
        Ok(artifact)
    }

    fn temp_dir(&self) -> MorphResult<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.config.temp_prefix);
        let dir = match &self.config.work_dir {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        Ok(dir)
    }

    fn compile_and_load(
        &self,
        dir: &Path,
        unit: &SourceUnit,
        contract: &TypeDescriptor,
    ) -> MorphResult<Artifact> {
        let source = dir.join(unit.file_name());
        std::fs::write(&source, &unit.text)?;

        tracing::debug!(
            class = %unit.class_name,
            compiler = self.compiler.name(),
            source = %source.display(),
            "compiling"
        );
        let outcome = self.compiler.compile(&self.classpath, &source)?;
        if !outcome.success {
            return Err(MorphError::Compilation {
                class: unit.class_name.clone(),
                diagnostics: outcome.diagnostics,
            });
        }

        tracing::debug!(class = %unit.class_name, "loading");
        let artifact = self.loader.load(&self.classpath, dir, &unit.class_name)?;
        if !artifact.is_subtype_of(&contract.name) {
            return Err(MorphError::load(
                &unit.class_name,
                format!("loaded class does not implement {}", contract.name),
            ));
        }
        Ok(artifact)
    }
}

impl<H> std::fmt::Debug for ClassGenerator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassGenerator")
            .field("config", &self.config)
            .field("classpath", &self.classpath)
            .field("cached", &self.cache.len())
            .finish()
    }
}
