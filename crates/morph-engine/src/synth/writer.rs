//! Class source synthesis.
//!
//! Assembles the source text of one generated class from a contract and the
//! hook fragments: imports, header, class body, constructor, then one method
//! per abstract method declared directly on the contract.

use super::hooks::SynthesisHooks;
use super::naming::param_name;
use crate::descriptor::types::OBJECT;
use crate::descriptor::{MethodDescriptor, TypeDescriptor, TypeKind, Visibility};
use crate::error::{MorphError, MorphResult};
use std::collections::BTreeSet;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Synthesized source of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Simple name of the generated class
    pub class_name: String,
    /// Full source text
    pub text: String,
    /// Types the hooks nominated as superclass or interfaces
    pub nominated: Vec<TypeDescriptor>,
}

impl SourceUnit {
    /// File name the unit is written to.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.class_name, crate::script::SOURCE_EXTENSION)
    }
}

/// Build the source of `class_name` implementing `contract`.
pub fn synthesize<H>(hooks: &H, contract: &TypeDescriptor, class_name: &str) -> MorphResult<SourceUnit>
where
    H: SynthesisHooks + ?Sized,
{
    if !contract.is_contract_kind() {
        return Err(MorphError::invalid_contract(
            &contract.name,
            format!("{} types cannot be implemented", contract.kind),
        ));
    }

    let mut nominated = Vec::new();

    // Header decision
    let superclass = if contract.is_interface() {
        match hooks.superclass(contract) {
            Some(superclass) => {
                if !superclass.is_class() {
                    return Err(MorphError::invalid_hierarchy(
                        &contract.name,
                        format!("{} cannot be used as a superclass", superclass),
                    ));
                }
                let name = superclass.name.clone();
                nominated.push(superclass);
                Some(name)
            }
            None => None,
        }
    } else {
        Some(contract.name.clone())
    };

    // Interfaces, de-duplicated and sorted by qualified name
    let mut interfaces = BTreeSet::new();
    for interface in hooks.interfaces(contract) {
        if interface.kind != TypeKind::Interface {
            return Err(MorphError::invalid_hierarchy(
                &contract.name,
                format!("{} cannot be implemented as an interface", interface),
            ));
        }
        if interfaces.insert(interface.name.clone()) {
            nominated.push(interface);
        }
    }
    if contract.is_interface() {
        interfaces.insert(contract.name.clone());
    }

    let mut text = String::new();

    // (a) imports
    let mut seen = BTreeSet::new();
    let imports: Vec<String> = hooks
        .imports(contract)
        .into_iter()
        .filter(|i| seen.insert(i.clone()))
        .collect();
    for import in &imports {
        let _ = writeln!(text, "import {};", import);
    }
    if !imports.is_empty() {
        text.push('\n');
    }

    // (b) header
    let _ = write!(text, "public class {}", class_name);
    if let Some(superclass) = superclass.as_deref().filter(|s| *s != OBJECT) {
        let _ = write!(text, " extends {}", superclass);
    }
    if !interfaces.is_empty() {
        let names: Vec<&str> = interfaces.iter().map(String::as_str).collect();
        let _ = write!(text, " implements {}", names.join(", "));
    }
    text.push_str(" {\n");

    let mut sections: Vec<String> = Vec::new();

    // (c) class body fragment
    if let Some(body) = hooks.class_body(contract).filter(|b| !b.trim().is_empty()) {
        sections.push(indent(&body, 1));
    }

    // (d) constructor
    if let Some(body) = hooks.constructor_body(contract, &contract.constructors) {
        let mut ctor = String::new();
        let _ = writeln!(ctor, "{}public {}() {{", INDENT, class_name);
        ctor.push_str(&indent(&body, 2));
        let _ = write!(ctor, "{}}}\n", INDENT);
        sections.push(ctor);
    }

    // (e) one method per abstract method declared on the contract
    for method in contract.abstract_methods() {
        let body = hooks.method_body(contract, method).unwrap_or_default();
        sections.push(method_source(method, &body));
    }

    text.push_str(&sections.join("\n"));
    text.push_str("}\n");

    Ok(SourceUnit {
        class_name: class_name.to_string(),
        text,
        nominated,
    })
}

fn method_source(method: &MethodDescriptor, body: &str) -> String {
    let visibility = match method.visibility {
        Visibility::Protected => "protected",
        _ => "public",
    };
    let params: Vec<String> = method
        .params
        .iter()
        .enumerate()
        .map(|(i, ty)| format!("{} {}", ty, param_name(i)))
        .collect();

    let mut out = String::new();
    let _ = write!(
        out,
        "{}{} {} {}({})",
        INDENT,
        visibility,
        method.return_type,
        method.name,
        params.join(", ")
    );
    if !method.throws.is_empty() {
        let _ = write!(out, " throws {}", method.throws.join(", "));
    }
    out.push_str(" {\n");
    out.push_str(&indent(body, 2));
    let _ = write!(out, "{}}}\n", INDENT);
    out
}

/// Indent every non-blank line of `fragment` by `level` steps.
fn indent(fragment: &str, level: usize) -> String {
    let prefix = INDENT.repeat(level);
    let mut out = String::new();
    for line in fragment.trim_matches('\n').lines() {
        let line = line.trim_end();
        if !line.is_empty() {
            out.push_str(&prefix);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}
