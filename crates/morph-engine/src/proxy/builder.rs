//! Delegating proxy builder.

use super::handler::CallHandler;
use super::hooks::{method_fields, DelegatingHooks, HANDLER_FIELD, INTERFACE_FIELD};
use crate::classpath::ClassPath;
use crate::config::GeneratorConfig;
use crate::descriptor::TypeDescriptor;
use crate::error::{MorphError, MorphResult};
use crate::generator::ClassGenerator;
use crate::vm::{Artifact, Object, Value};
use std::sync::Arc;

/// Builds objects implementing any interface by forwarding every call to a
/// [`CallHandler`].
///
/// Proxy classes are generated once per interface and shared by every
/// handler; each [`augment`](Self::augment) creates a fresh instance and
/// patches the handler, interface and method descriptors into it.
#[derive(Debug)]
pub struct DelegatingProxyBuilder {
    generator: ClassGenerator<DelegatingHooks>,
}

impl DelegatingProxyBuilder {
    /// A builder with the default configuration.
    pub fn new() -> Self {
        Self {
            generator: ClassGenerator::new(DelegatingHooks),
        }
    }

    /// A builder whose generator is built from `config`.
    pub fn with_config(config: GeneratorConfig) -> MorphResult<Self> {
        Ok(Self {
            generator: ClassGenerator::with_config(DelegatingHooks, config)?,
        })
    }

    /// Use `classpath` for the interfaces' referenced types.
    pub fn with_classpath(mut self, classpath: ClassPath) -> Self {
        self.generator = self.generator.with_classpath(classpath);
        self
    }

    /// Wrap an already configured generator.
    pub fn from_generator(generator: ClassGenerator<DelegatingHooks>) -> Self {
        Self { generator }
    }

    /// The generator producing the proxy classes.
    pub fn generator(&self) -> &ClassGenerator<DelegatingHooks> {
        &self.generator
    }

    /// An object implementing `iface` whose calls go to `handler`.
    pub fn augment(&self, iface: &TypeDescriptor, handler: Arc<dyn CallHandler>) -> MorphResult<Object> {
        if !iface.is_interface() {
            return Err(MorphError::invalid_contract(
                &iface.name,
                format!("only interfaces can be proxied, not a {}", iface.kind),
            ));
        }

        let object = self.generator.new_instance(iface)?;
        let class = object.class().clone();

        patch(&class, &object, HANDLER_FIELD, Value::Handler(handler))?;
        patch(
            &class,
            &object,
            INTERFACE_FIELD,
            Value::Class(Arc::new(iface.clone())),
        )?;
        for (field, method) in method_fields(iface) {
            patch(&class, &object, &field, Value::from(method.clone()))?;
        }

        tracing::debug!(iface = %iface.name, class = class.name(), "bound proxy");
        Ok(object)
    }
}

impl Default for DelegatingProxyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write a private synthesized field with access granted for the duration
/// of the write.
fn patch(class: &Artifact, object: &Object, name: &str, value: Value) -> MorphResult<()> {
    let patching = |reason: String| MorphError::Patching {
        class: class.name().to_string(),
        field: name.to_string(),
        reason,
    };
    let field = class
        .declared_field(name)
        .map_err(|_| patching("is missing".to_string()))?;
    let _access = field.grant();
    field.set(object, value).map_err(|e| patching(e.to_string()))
}
