//! Synthesis hooks producing forwarding stubs.

use crate::descriptor::types::OBJECT;
use crate::descriptor::{MethodDescriptor, TypeDescriptor, TypeRef};
use crate::synth::naming::param_name;
use crate::synth::SynthesisHooks;

/// Field holding the call handler.
pub const HANDLER_FIELD: &str = "handler";

/// Field holding the interface identity.
pub const INTERFACE_FIELD: &str = "iface";

const METHOD_FIELD_PREFIX: &str = "method_";

/// Descriptor fields of `contract`, one per declared method (default
/// methods included), in declaration order.
///
/// A method whose name is unique on the contract gets `method_<name>`;
/// overloads get `method_<name>$<n>` with `n` counting the overloads of that
/// name from zero.
pub fn method_fields(contract: &TypeDescriptor) -> Vec<(String, &MethodDescriptor)> {
    let methods: Vec<&MethodDescriptor> = contract.methods.iter().collect();
    methods
        .iter()
        .enumerate()
        .map(|(i, method)| {
            let overloads = methods.iter().filter(|m| m.name == method.name).count();
            let name = if overloads == 1 {
                format!("{}{}", METHOD_FIELD_PREFIX, method.name)
            } else {
                let nth = methods[..i].iter().filter(|m| m.name == method.name).count();
                format!("{}{}${}", METHOD_FIELD_PREFIX, method.name, nth)
            };
            (name, *method)
        })
        .collect()
}

/// Hooks for delegating proxies: no imports, superclass or extra
/// interfaces; private fields for the handler, the interface and one
/// descriptor per method; each method forwards to `handler.call`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegatingHooks;

impl SynthesisHooks for DelegatingHooks {
    fn class_body(&self, contract: &TypeDescriptor) -> Option<String> {
        let mut body = format!(
            "private Handler {};\nprivate Class {};\n",
            HANDLER_FIELD, INTERFACE_FIELD
        );
        for (field, _) in method_fields(contract) {
            body.push_str(&format!("private Method {};\n", field));
        }
        Some(body)
    }

    fn method_body(&self, contract: &TypeDescriptor, method: &MethodDescriptor) -> Option<String> {
        let field = method_fields(contract)
            .into_iter()
            .find(|(_, m)| *m == method)
            .map(|(name, _)| name)?;

        let mut args = vec![INTERFACE_FIELD.to_string(), field];
        args.extend((0..method.params.len()).map(param_name));
        let call = format!("{}.call({})", HANDLER_FIELD, args.join(", "));

        Some(match &method.return_type {
            TypeRef::Void => format!("{};", call),
            TypeRef::Named(name) if name == OBJECT => format!("return {};", call),
            ty => format!("return ({}) {};", ty, call),
        })
    }
}
