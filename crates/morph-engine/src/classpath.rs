//! Host type registry.
//!
//! The classpath is what generated code compiles and links against: every
//! named type a source unit mentions must either be builtin or be registered
//! here. Host types may carry native implementations of their concrete
//! methods, which generated subclasses inherit.

use crate::descriptor::types::{BUILTIN_TYPES, OBJECT};
use crate::descriptor::TypeDescriptor;
use crate::error::{MorphError, MorphResult};
use crate::vm::{Object, Value};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Native implementation of a host method, called with the receiver and the
/// already-converted arguments.
pub type NativeMethod = Arc<dyn Fn(&Object, &[Value]) -> MorphResult<Value> + Send + Sync>;

/// Separator between entries in a classpath argument.
#[cfg(windows)]
pub const PATH_SEPARATOR: &str = ";";
/// Separator between entries in a classpath argument.
#[cfg(not(windows))]
pub const PATH_SEPARATOR: &str = ":";

/// A caller-side type: its descriptor plus native method implementations.
#[derive(Clone)]
pub struct HostType {
    descriptor: TypeDescriptor,
    natives: FxHashMap<String, NativeMethod>,
}

impl HostType {
    /// A host type with no native methods yet.
    pub fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            natives: FxHashMap::default(),
        }
    }

    /// Provide the implementation of a concrete method.
    pub fn implement<F>(mut self, name: &str, arity: usize, method: F) -> Self
    where
        F: Fn(&Object, &[Value]) -> MorphResult<Value> + Send + Sync + 'static,
    {
        self.natives.insert(native_key(name, arity), Arc::new(method));
        self
    }

    /// The type's descriptor.
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Qualified name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Native implementation for `name` taking `arity` arguments.
    pub fn native(&self, name: &str, arity: usize) -> Option<&NativeMethod> {
        self.natives.get(&native_key(name, arity))
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut natives: Vec<&String> = self.natives.keys().collect();
        natives.sort();
        f.debug_struct("HostType")
            .field("name", &self.descriptor.name)
            .field("natives", &natives)
            .finish()
    }
}

fn native_key(name: &str, arity: usize) -> String {
    format!("{}/{}", name, arity)
}

/// Shared registry of host types plus a list of descriptor directories.
///
/// Clones share the type registry; directory entries are per clone.
#[derive(Clone, Default)]
pub struct ClassPath {
    entries: Vec<PathBuf>,
    types: Arc<RwLock<FxHashMap<String, Arc<HostType>>>>,
}

impl ClassPath {
    /// An empty classpath with no directory entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory entry.
    pub fn with_entry(mut self, entry: impl AsRef<Path>) -> Self {
        self.entries.push(entry.as_ref().to_path_buf());
        self
    }

    /// Directory entries, in search order.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Register a host type, returning the one it replaced.
    pub fn define(&self, host: HostType) -> Option<Arc<HostType>> {
        let name = host.name().to_string();
        self.types.write().insert(name, Arc::new(host))
    }

    /// Register a plain descriptor unless a type of that name already exists.
    ///
    /// Returns the registered host type either way.
    pub fn define_if_absent(&self, descriptor: &TypeDescriptor) -> Arc<HostType> {
        if let Some(existing) = self.lookup(&descriptor.name) {
            return existing;
        }
        self.types
            .write()
            .entry(descriptor.name.clone())
            .or_insert_with(|| Arc::new(HostType::new(descriptor.clone())))
            .clone()
    }

    /// Like [`define_if_absent`](Self::define_if_absent), but fails when the
    /// type already registered under the name has a different descriptor.
    pub fn define_matching(&self, descriptor: &TypeDescriptor) -> MorphResult<Arc<HostType>> {
        let host = self.define_if_absent(descriptor);
        if host.descriptor() != descriptor {
            return Err(MorphError::invalid_contract(
                &descriptor.name,
                format!("conflicting descriptor for {}", descriptor.name),
            ));
        }
        Ok(host)
    }

    /// The registered host type named `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<HostType>> {
        self.types.read().get(name).cloned()
    }

    /// The descriptor registered under `name`.
    pub fn descriptor(&self, name: &str) -> Option<TypeDescriptor> {
        self.lookup(name).map(|host| host.descriptor.clone())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    /// Whether `name` is registered or builtin.
    pub fn resolves(&self, name: &str) -> bool {
        BUILTIN_TYPES.contains(&name) || self.contains(name)
    }

    /// Number of registered host types.
    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// Whether `sub` is `sup` or transitively extends or implements it.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        let mut visited = FxHashSet::default();
        self.is_subtype_inner(sub, sup, &mut visited)
    }

    fn is_subtype_inner(&self, sub: &str, sup: &str, visited: &mut FxHashSet<String>) -> bool {
        if sub == sup || sup == OBJECT {
            return true;
        }
        if !visited.insert(sub.to_string()) {
            return false;
        }
        let Some(host) = self.lookup(sub) else {
            return false;
        };
        let descriptor = host.descriptor();
        descriptor
            .superclass
            .iter()
            .chain(descriptor.interfaces.iter())
            .any(|parent| self.is_subtype_inner(parent, sup, visited))
    }

    /// Superclass chain of `name`, nearest first, excluding `name` itself.
    pub fn superclasses(&self, name: &str) -> Vec<Arc<HostType>> {
        let mut chain = Vec::new();
        let mut visited = FxHashSet::default();
        let mut current = self.lookup(name).and_then(|h| h.descriptor.superclass.clone());
        while let Some(next) = current {
            if !visited.insert(next.clone()) {
                break;
            }
            let Some(host) = self.lookup(&next) else {
                break;
            };
            current = host.descriptor.superclass.clone();
            chain.push(host);
        }
        chain
    }

    /// All interfaces reachable from `names`, breadth first, without duplicates.
    pub fn interface_closure<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> Vec<Arc<HostType>> {
        let mut queue: std::collections::VecDeque<String> = names.into_iter().cloned().collect();
        let mut visited = FxHashSet::default();
        let mut closure = Vec::new();
        while let Some(name) = queue.pop_front() {
            if !visited.insert(name.clone()) {
                continue;
            }
            if let Some(host) = self.lookup(&name) {
                queue.extend(host.descriptor.interfaces.iter().cloned());
                closure.push(host);
            }
        }
        closure
    }

    /// Read every `*.json` descriptor in the directory entries.
    ///
    /// Already registered names are left untouched. Returns the number of
    /// newly registered types.
    pub fn load_entries(&self) -> MorphResult<usize> {
        let mut loaded = 0;
        for entry in &self.entries {
            let mut paths: Vec<PathBuf> = std::fs::read_dir(entry)?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            paths.sort();

            for path in paths {
                let json = std::fs::read_to_string(&path)?;
                let descriptor = TypeDescriptor::from_json(&json).map_err(|e| {
                    MorphError::load(&path.display().to_string(), format!("bad descriptor: {}", e))
                })?;
                if !self.contains(&descriptor.name) {
                    self.define_if_absent(&descriptor);
                    loaded += 1;
                }
            }
            tracing::debug!(entry = %entry.display(), "loaded classpath entry");
        }
        Ok(loaded)
    }

    /// Write every registered descriptor as `<name>.json` into `dir`.
    ///
    /// Lets an external compiler process see types that only exist in memory.
    pub fn export(&self, dir: &Path) -> MorphResult<usize> {
        std::fs::create_dir_all(dir)?;
        let types: Vec<Arc<HostType>> = self.types.read().values().cloned().collect();
        for host in &types {
            let json = host
                .descriptor
                .to_json()
                .map_err(|e| MorphError::load(host.name(), e.to_string()))?;
            std::fs::write(dir.join(format!("{}.json", host.name())), json)?;
        }
        Ok(types.len())
    }

    /// Entries joined with the platform path separator.
    pub fn to_arg(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.display().to_string())
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }
}

impl fmt::Debug for ClassPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("ClassPath")
            .field("entries", &self.entries)
            .field("types", &names)
            .finish()
    }
}
