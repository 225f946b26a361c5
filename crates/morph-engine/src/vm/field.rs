//! Reflective field handles.

use super::class::Artifact;
use super::object::Object;
use super::value::Value;
use crate::descriptor::{TypeRef, Visibility};
use crate::error::{MorphError, MorphResult};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A handle to one declared instance field of a generated class.
///
/// Non-public fields can only be read or written after access has been
/// granted on the handle. Each handle carries its own access flag.
pub struct Field {
    class: Artifact,
    slot: usize,
    accessible: AtomicBool,
}

impl Field {
    pub(crate) fn new(class: Artifact, slot: usize) -> Self {
        Self {
            class,
            slot,
            accessible: AtomicBool::new(false),
        }
    }

    fn def(&self) -> &crate::script::unit::FieldDef {
        &self.class.fields()[self.slot]
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.def().name
    }

    /// Declared type.
    pub fn ty(&self) -> &TypeRef {
        &self.def().ty
    }

    /// Declared visibility.
    pub fn visibility(&self) -> Visibility {
        self.def().visibility
    }

    /// Whether the field was declared `final`.
    pub fn is_final(&self) -> bool {
        self.def().is_final
    }

    /// Whether reads and writes bypass visibility checks.
    pub fn is_accessible(&self) -> bool {
        self.accessible.load(Ordering::Acquire)
    }

    /// Grant or revoke access for every handle of this field.
    pub fn set_accessible(&self, accessible: bool) {
        self.accessible.store(accessible, Ordering::Release);
    }

    /// Make the field accessible until the returned guard is dropped, then
    /// restore the previous access state.
    pub fn grant(&self) -> AccessGuard<'_> {
        let previous = self.accessible.swap(true, Ordering::AcqRel);
        AccessGuard {
            field: self,
            previous,
        }
    }

    fn check(&self, object: &Object, writing: bool) -> MorphResult<()> {
        if !Arc::ptr_eq(object.class(), &self.class) {
            return Err(MorphError::IllegalArgument(format!(
                "{} is not an instance of {}",
                object.class().name(),
                self.class.name()
            )));
        }
        let open = self.visibility() == Visibility::Public && !(writing && self.is_final());
        if !open && !self.is_accessible() {
            return Err(MorphError::IllegalAccess {
                class: self.class.name().to_string(),
                field: self.name().to_string(),
            });
        }
        Ok(())
    }

    /// Read the field of `object`.
    pub fn get(&self, object: &Object) -> MorphResult<Value> {
        self.check(object, false)?;
        object.field_value(self.slot)
    }

    /// Write the field of `object`, converting the value to the field type.
    pub fn set(&self, object: &Object, value: Value) -> MorphResult<()> {
        self.check(object, true)?;
        let converted = value.coerce_to(self.ty()).ok_or_else(|| {
            MorphError::IllegalArgument(format!(
                "cannot set {} field {}.{} to {}",
                self.ty(),
                self.class.name(),
                self.name(),
                value.kind_name()
            ))
        })?;
        object.set_field_value(self.slot, converted)
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("class", &self.class.name())
            .field("name", &self.name())
            .field("ty", self.ty())
            .field("accessible", &self.is_accessible())
            .finish()
    }
}

/// Restores a field's access state on drop.
pub struct AccessGuard<'a> {
    field: &'a Field,
    previous: bool,
}

impl Drop for AccessGuard<'_> {
    fn drop(&mut self) {
        self.field.set_accessible(self.previous);
    }
}
