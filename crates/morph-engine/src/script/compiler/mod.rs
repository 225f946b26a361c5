//! Semantic analysis and lowering.
//!
//! Checks a parsed unit against the classpath and produces the
//! [`CompiledClass`] the loader links. All problems are collected and
//! reported together; nothing is emitted when any check fails.

mod body;
mod class;
mod diagnostic;
mod types;

pub use diagnostic::Diagnostic;

use crate::classpath::ClassPath;
use crate::script::ast::{CompilationUnit, Member};
use crate::script::unit::{CompiledClass, ConstructorDef, FieldDef, MethodDef, UNIT_FORMAT_VERSION};
use body::{block_completes_normally, BodyKind, BodyLowering};
use class::ClassContext;
use types::TypeScope;

/// Check and lower one parsed unit.
pub fn compile_unit(
    unit: &CompilationUnit,
    classpath: &ClassPath,
) -> Result<CompiledClass, Vec<Diagnostic>> {
    let decl = &unit.class;
    let mut diagnostics = Vec::new();

    let scope = TypeScope::new(classpath, &unit.imports, &decl.name, &mut diagnostics);
    let info = class::declare(decl, &scope, &mut diagnostics);
    let ctx = ClassContext::new(scope, info);
    class::check_inheritance(&ctx, decl, &mut diagnostics);

    let mut fields = Vec::new();
    let mut statics = Vec::new();
    let mut constructors = Vec::new();
    let mut methods = Vec::new();
    let mut field_infos = ctx.info.fields.iter();
    let mut method_sigs = ctx.info.methods.iter();
    let mut ctor_params = ctx.info.constructors.iter();

    for member in &decl.members {
        match member {
            Member::Field(field) => {
                let Some(info) = field_infos.next() else {
                    continue;
                };
                let kind = if info.is_static {
                    BodyKind::StaticInit
                } else {
                    BodyKind::InstanceInit
                };
                let init = field.init.as_ref().map(|init| {
                    BodyLowering::new(&ctx, &mut diagnostics, kind).lower_as(init, &info.ty)
                });
                let def = FieldDef {
                    name: info.name.clone(),
                    ty: info.ty.clone(),
                    visibility: info.visibility,
                    is_final: info.is_final,
                    init,
                };
                if info.is_static {
                    statics.push(def);
                } else {
                    fields.push(def);
                }
            }
            Member::Method(method) => {
                let Some(sig) = method_sigs.next() else {
                    continue;
                };
                let mut lowering = BodyLowering::new(
                    &ctx,
                    &mut diagnostics,
                    BodyKind::Method(sig.return_type.clone()),
                );
                lowering.declare_params(&method.params, &sig.params);
                let body = lowering.lower_block(&method.body);
                let locals = lowering.locals();
                if !sig.return_type.is_void() && block_completes_normally(&method.body) {
                    diagnostics.push(Diagnostic::new("missing return statement", method.body.span));
                }
                methods.push(MethodDef {
                    name: sig.name.clone(),
                    params: sig.params.clone(),
                    return_type: sig.return_type.clone(),
                    throws: sig.throws.clone(),
                    visibility: sig.visibility,
                    locals,
                    body,
                });
            }
            Member::Constructor(ctor) => {
                let Some(params) = ctor_params.next() else {
                    continue;
                };
                if ctor.name != decl.name {
                    diagnostics.push(Diagnostic::new(
                        "invalid method declaration; return type required",
                        ctor.span,
                    ));
                }
                let mut lowering = BodyLowering::new(&ctx, &mut diagnostics, BodyKind::Constructor);
                lowering.declare_params(&ctor.params, params);
                let body = lowering.lower_block(&ctor.body);
                constructors.push(ConstructorDef {
                    params: params.clone(),
                    visibility: ctor.modifiers.visibility(),
                    locals: lowering.locals(),
                    body,
                });
            }
        }
    }

    if constructors.is_empty() {
        constructors.push(ConstructorDef {
            params: Vec::new(),
            visibility: decl.modifiers.visibility(),
            locals: 0,
            body: Vec::new(),
        });
    }

    if !diagnostics.is_empty() {
        diagnostics.sort_by_key(|d| (d.span.line, d.span.column));
        return Err(diagnostics);
    }

    Ok(CompiledClass {
        format_version: UNIT_FORMAT_VERSION,
        name: ctx.info.name.clone(),
        superclass: ctx.info.superclass.clone(),
        interfaces: ctx.info.interfaces.clone(),
        fields,
        statics,
        constructors,
        methods,
    })
}
