//! Instances of generated classes and method dispatch.

use super::builtins;
use super::class::Artifact;
use super::interpreter;
use super::value::Value;
use crate::classpath::HostType;
use crate::descriptor::MethodDescriptor;
use crate::error::{MorphError, MorphResult};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

struct ObjectData {
    id: u64,
    class: Artifact,
    fields: RwLock<Vec<Value>>,
}

/// A shared handle to an instance of a generated class.
///
/// Clones refer to the same instance; equality is identity.
#[derive(Clone)]
pub struct Object(Arc<ObjectData>);

impl Object {
    pub(crate) fn new(class: Artifact, fields: Vec<Value>) -> Self {
        Object(Arc::new(ObjectData {
            id: generate_object_id(),
            class,
            fields: RwLock::new(fields),
        }))
    }

    /// Unique object ID (used for identity hash codes)
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// The class this object is an instance of.
    pub fn class(&self) -> &Artifact {
        &self.0.class
    }

    /// Whether both handles refer to the same instance.
    pub fn same(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether the instance's class is `type_name` or one of its subtypes.
    pub fn is_instance_of(&self, type_name: &str) -> bool {
        self.0.class.is_subtype_of(type_name)
    }

    pub(crate) fn field_value(&self, slot: usize) -> MorphResult<Value> {
        self.0
            .fields
            .read()
            .get(slot)
            .cloned()
            .ok_or_else(|| bad_slot(self, slot))
    }

    pub(crate) fn set_field_value(&self, slot: usize, value: Value) -> MorphResult<()> {
        let mut fields = self.0.fields.write();
        let entry = fields.get_mut(slot).ok_or_else(|| bad_slot(self, slot))?;
        *entry = value;
        Ok(())
    }

    /// Invoke a method by name.
    ///
    /// Dispatch order: methods of the generated class, natives along the
    /// host superclass chain, interface defaults, then builtins.
    pub fn invoke(&self, name: &str, args: &[Value]) -> MorphResult<Value> {
        if let Some((method, converted)) = self.0.class.find_method(name, args)? {
            return interpreter::call_method(self, method, converted);
        }
        self.invoke_inherited(name, args)
    }

    /// Invoke skipping the generated class's own methods (`super.name(...)`).
    pub(crate) fn invoke_inherited(&self, name: &str, args: &[Value]) -> MorphResult<Value> {
        let class = &self.0.class;
        let hosts = class.supertypes();
        for host in &hosts {
            if let Some(native) = host.native(name, args.len()) {
                let converted = convert_native_args(host, name, args)?;
                return native(self, &converted);
            }
        }
        if let Some(result) = builtins::invoke_object(self, name, args) {
            return result;
        }

        let method = format!("{}/{}", name, args.len());
        let declared_abstract = hosts.iter().any(|host| {
            host.descriptor()
                .find_methods(name, args.len())
                .any(|m| m.is_abstract)
        });
        if declared_abstract {
            Err(MorphError::AbstractMethod {
                class: class.name().to_string(),
                method,
            })
        } else {
            Err(MorphError::NoSuchMethod {
                class: class.name().to_string(),
                method,
            })
        }
    }
}

/// Convert arguments for a native using the host's declared parameter types.
fn convert_native_args(host: &HostType, name: &str, args: &[Value]) -> MorphResult<Vec<Value>> {
    let declared: Vec<&MethodDescriptor> = host.descriptor().find_methods(name, args.len()).collect();
    if declared.is_empty() {
        return Ok(args.to_vec());
    }
    declared
        .iter()
        .find_map(|method| {
            method
                .params
                .iter()
                .zip(args)
                .map(|(ty, arg)| arg.coerce_to(ty))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| {
            MorphError::IllegalArgument(format!(
                "arguments do not match {}.{}",
                host.name(),
                declared[0].signature()
            ))
        })
}

fn bad_slot(object: &Object, slot: usize) -> MorphError {
    MorphError::IllegalArgument(format!(
        "{} has no field slot {}",
        object.class().name(),
        slot
    ))
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.0.id)
            .field("class", &self.0.class.name())
            .field("fields", &*self.0.fields.read())
            .finish()
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classpath::ClassPath;
    use crate::config::DEFAULT_MAX_CALL_DEPTH;
    use crate::descriptor::{TypeDescriptor, TypeRef};
    use crate::vm::testing::load;
    use crate::vm::GeneratedClass;

    #[test]
    fn test_identity() {
        let class = load("public class A { }", &ClassPath::new());
        let a = class.instantiate().unwrap();
        let b = class.instantiate().unwrap();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.id() < b.id());
        assert!(a.is_instance_of("Object"));
    }

    #[test]
    fn test_native_arguments_are_converted() {
        let base = TypeDescriptor::abstract_class("demo.Base").method(
            MethodDescriptor::new("twice")
                .param(TypeRef::long())
                .returns(TypeRef::long())
                .concrete(),
        );
        let classpath = ClassPath::new();
        classpath.define(HostType::new(base).implement("twice", 1, |_, args| {
            match args[0] {
                Value::Long(n) => Ok(Value::Long(n * 2)),
                ref other => Err(MorphError::IllegalArgument(format!("got {:?}", other))),
            }
        }));

        let class = load("public class B extends demo.Base { }", &classpath);
        let object = class.instantiate().unwrap();
        assert_eq!(object.invoke("twice", &[Value::Int(21)]).unwrap(), Value::Long(42));
        assert!(matches!(
            object.invoke("twice", &[Value::from("x")]),
            Err(MorphError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_abstract_method_without_implementation() {
        let task = TypeDescriptor::interface("demo.Task").method(MethodDescriptor::new("run"));
        let compiled_against = ClassPath::new();
        compiled_against.define_if_absent(&task);
        let unit = crate::script::compile_source(
            "public class T implements demo.Task { public void run() { } }",
            &compiled_against,
        )
        .unwrap();

        // the interface gained a method after the class was compiled
        let linked_against = ClassPath::new();
        linked_against.define_if_absent(&task.method(MethodDescriptor::new("stop")));
        let class = GeneratedClass::link(unit, &linked_against, DEFAULT_MAX_CALL_DEPTH).unwrap();
        let object = class.instantiate().unwrap();

        assert_eq!(object.invoke("run", &[]).unwrap(), Value::Null);
        assert!(matches!(
            object.invoke("stop", &[]),
            Err(MorphError::AbstractMethod { .. })
        ));
        assert!(matches!(
            object.invoke("pause", &[]),
            Err(MorphError::NoSuchMethod { .. })
        ));
    }
}
