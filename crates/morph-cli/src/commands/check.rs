//! `morph check`: generate and bind a proxy for a contract.

use super::{load_config, load_contract};
use morph_engine::{
    CallHandler, DelegatingProxyBuilder, GeneratedClass, MethodDescriptor, MorphError, TypeDescriptor,
    Value, Visibility,
};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

pub fn execute(contract: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let contract = load_contract(contract)?;
    let builder = DelegatingProxyBuilder::with_config(load_config(config)?)?;
    print!("{}", check(&builder, &contract)?);
    Ok(())
}

/// Bind a proxy with a refusing handler and describe its class.
fn check(builder: &DelegatingProxyBuilder, contract: &TypeDescriptor) -> anyhow::Result<String> {
    let refuse: Arc<dyn CallHandler> =
        Arc::new(|_: &TypeDescriptor, method: &MethodDescriptor, _: &[Value]| {
            Err::<Value, _>(MorphError::handler(format!("{} called during check", method.name)))
        });
    let proxy = builder.augment(contract, refuse)?;
    Ok(describe(contract, proxy.class()))
}

fn describe(contract: &TypeDescriptor, class: &GeneratedClass) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} -> {}", contract.name, class.name());
    let _ = writeln!(out, "  extends {}", class.superclass());
    for iface in class.interfaces() {
        let _ = writeln!(out, "  implements {}", iface);
    }
    for field in class.fields() {
        let _ = writeln!(out, "  field {}{} {}", modifier(field.visibility), field.ty, field.name);
    }
    for method in class.methods() {
        let _ = writeln!(
            out,
            "  method {}{} {}",
            modifier(method.visibility),
            method.return_type,
            method.signature()
        );
    }
    out
}

fn modifier(visibility: Visibility) -> String {
    visibility.keyword().map(|k| format!("{} ", k)).unwrap_or_default()
}
