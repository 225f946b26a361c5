//! Loaded classes.

use super::field::Field;
use super::interpreter;
use super::object::Object;
use super::value::Value;
use crate::classpath::{ClassPath, HostType};
use crate::descriptor::types::OBJECT;
use crate::descriptor::Visibility;
use crate::error::{MorphError, MorphResult};
use crate::script::unit::{CompiledClass, FieldDef, MethodDef};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A loaded, instantiable generated class.
pub type Artifact = Arc<GeneratedClass>;

/// A compiled unit linked against a classpath.
pub struct GeneratedClass {
    unit: CompiledClass,
    statics: RwLock<Vec<Value>>,
    classpath: ClassPath,
    max_call_depth: usize,
}

impl GeneratedClass {
    /// Link a compiled unit: resolve its supertypes and run static
    /// initializers.
    pub fn link(
        unit: CompiledClass,
        classpath: &ClassPath,
        max_call_depth: usize,
    ) -> MorphResult<Artifact> {
        for supertype in std::iter::once(&unit.superclass).chain(unit.interfaces.iter()) {
            if !classpath.resolves(supertype) {
                return Err(MorphError::load(
                    &unit.name,
                    format!("cannot resolve supertype {}", supertype),
                ));
            }
        }

        let statics = unit
            .statics
            .iter()
            .map(|field| Value::default_for(&field.ty))
            .collect();
        let class = Arc::new(GeneratedClass {
            unit,
            statics: RwLock::new(statics),
            classpath: classpath.clone(),
            max_call_depth,
        });

        for (slot, field) in class.unit.statics.iter().enumerate() {
            let Some(init) = &field.init else {
                continue;
            };
            let value = interpreter::eval_initializer(&class, None, init, &field.ty)
                .map_err(|e| {
                    MorphError::load(
                        class.name(),
                        format!("static initializer of {} failed: {}", field.name, e),
                    )
                })?;
            class.statics.write()[slot] = value;
        }
        Ok(class)
    }

    /// Class name.
    pub fn name(&self) -> &str {
        &self.unit.name
    }

    /// Qualified superclass name.
    pub fn superclass(&self) -> &str {
        &self.unit.superclass
    }

    /// Directly implemented interfaces.
    pub fn interfaces(&self) -> &[String] {
        &self.unit.interfaces
    }

    /// The compiled unit this class was linked from.
    pub fn unit(&self) -> &CompiledClass {
        &self.unit
    }

    /// The classpath the class was linked against.
    pub fn classpath(&self) -> &ClassPath {
        &self.classpath
    }

    /// Call depth at which invocations fail.
    pub fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Declared instance fields, in slot order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.unit.fields
    }

    /// Declared methods.
    pub fn methods(&self) -> &[MethodDef] {
        &self.unit.methods
    }

    /// Whether this class is `name`, extends it or implements it.
    pub fn is_subtype_of(&self, name: &str) -> bool {
        name == self.unit.name
            || name == OBJECT
            || std::iter::once(&self.unit.superclass)
                .chain(self.unit.interfaces.iter())
                .any(|parent| self.classpath.is_subtype(parent, name))
    }

    /// Host types this class inherits from: the superclass chain nearest
    /// first, then every reachable interface.
    pub(crate) fn supertypes(&self) -> Vec<Arc<HostType>> {
        let mut chain: Vec<Arc<HostType>> =
            self.classpath.lookup(&self.unit.superclass).into_iter().collect();
        chain.extend(self.classpath.superclasses(&self.unit.superclass));

        let mut roots = self.unit.interfaces.clone();
        for host in &chain {
            roots.extend(host.descriptor().interfaces.iter().cloned());
        }
        let interfaces = self.classpath.interface_closure(roots.iter());
        chain.extend(interfaces);
        chain
    }

    /// The declared method matching `name` whose parameters accept `args`,
    /// with the arguments converted.
    ///
    /// Fails with `IllegalArgument` when methods of that name and arity
    /// exist but none accepts the arguments.
    pub(crate) fn find_method(
        &self,
        name: &str,
        args: &[Value],
    ) -> MorphResult<Option<(&MethodDef, Vec<Value>)>> {
        let mut candidates = self
            .unit
            .methods
            .iter()
            .filter(|m| m.name == name && m.params.len() == args.len())
            .peekable();
        if candidates.peek().is_none() {
            return Ok(None);
        }
        let mut first = None;
        for method in candidates {
            first.get_or_insert(method);
            let converted: Option<Vec<Value>> = method
                .params
                .iter()
                .zip(args)
                .map(|(ty, arg)| arg.coerce_to(ty))
                .collect();
            if let Some(converted) = converted {
                return Ok(Some((method, converted)));
            }
        }
        let found: Vec<String> = args.iter().map(Value::kind_name).collect();
        Err(MorphError::IllegalArgument(format!(
            "{}.{} cannot be applied to ({})",
            self.name(),
            first.map(MethodDef::signature).unwrap_or_default(),
            found.join(",")
        )))
    }

    pub(crate) fn static_value(&self, slot: usize) -> MorphResult<Value> {
        self.statics
            .read()
            .get(slot)
            .cloned()
            .ok_or_else(|| self.bad_static(slot))
    }

    pub(crate) fn set_static_value(&self, slot: usize, value: Value) -> MorphResult<()> {
        let mut statics = self.statics.write();
        let entry = statics.get_mut(slot).ok_or_else(|| self.bad_static(slot))?;
        *entry = value;
        Ok(())
    }

    fn bad_static(&self, slot: usize) -> MorphError {
        MorphError::IllegalArgument(format!("{} has no static slot {}", self.name(), slot))
    }

    /// Current value of a static field, by name.
    pub fn static_field(&self, name: &str) -> Option<Value> {
        let slot = self.unit.statics.iter().position(|f| f.name == name)?;
        self.statics.read().get(slot).cloned()
    }

    /// Create an instance: default field values, field initializers, then the
    /// no-argument constructor.
    pub fn instantiate(self: &Arc<Self>) -> MorphResult<Object> {
        self.construct().map_err(|e| MorphError::Instantiation {
            class: self.name().to_string(),
            reason: e.to_string(),
        })
    }

    fn construct(self: &Arc<Self>) -> MorphResult<Object> {
        let constructor = self
            .unit
            .constructors
            .iter()
            .find(|c| c.params.is_empty())
            .ok_or_else(|| MorphError::NoSuchMethod {
                class: self.name().to_string(),
                method: "<init>/0".to_string(),
            })?;
        if constructor.visibility == Visibility::Private {
            return Err(MorphError::IllegalAccess {
                class: self.name().to_string(),
                field: "<init>".to_string(),
            });
        }

        let defaults = self
            .unit
            .fields
            .iter()
            .map(|field| Value::default_for(&field.ty))
            .collect();
        let object = Object::new(self.clone(), defaults);
        for (slot, field) in self.unit.fields.iter().enumerate() {
            if let Some(init) = &field.init {
                let value = interpreter::eval_initializer(self, Some(&object), init, &field.ty)?;
                object.set_field_value(slot, value)?;
            }
        }
        interpreter::run_constructor(&object, constructor)?;
        Ok(object)
    }

    /// Reflective handle to a declared instance field.
    pub fn declared_field(self: &Arc<Self>, name: &str) -> MorphResult<Field> {
        self.unit
            .fields
            .iter()
            .position(|f| f.name == name)
            .map(|slot| Field::new(self.clone(), slot))
            .ok_or_else(|| MorphError::NoSuchField {
                class: self.name().to_string(),
                field: name.to_string(),
            })
    }
}

impl fmt::Debug for GeneratedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let methods: Vec<String> = self.unit.methods.iter().map(MethodDef::signature).collect();
        f.debug_struct("GeneratedClass")
            .field("name", &self.unit.name)
            .field("superclass", &self.unit.superclass)
            .field("interfaces", &self.unit.interfaces)
            .field("methods", &methods)
            .finish()
    }
}

impl fmt::Display for GeneratedClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class {}", self.unit.name)
    }
}
