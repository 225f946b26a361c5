//! Lowering of statements and expressions into unit IR.

use super::class::{ClassContext, MethodSig};
use super::diagnostic::Diagnostic;
use super::types::{builtin_method, Ty};
use crate::descriptor::types::{BUILTIN_TYPES, OBJECT};
use crate::descriptor::{PrimitiveKind, TypeRef};
use crate::script::ast::{
    self, AssignOp, Block, Expr, ExprKind, Literal, LogicalOp, Param, Stmt, UnaryOp,
};
use crate::script::token::Span;
use crate::script::unit::{self as ir, BinaryOp, CastMode, Constant};
use rustc_hash::FxHashMap;

/// What kind of code is being lowered.
#[derive(Debug, Clone)]
pub(crate) enum BodyKind {
    Method(TypeRef),
    Constructor,
    InstanceInit,
    StaticInit,
}

#[derive(Debug, Clone)]
struct Local {
    slot: usize,
    ty: TypeRef,
}

/// A storage location an assignment can target.
enum Place {
    Local(usize, TypeRef),
    Field(usize, TypeRef),
    Static(usize, TypeRef),
}

impl Place {
    fn ty(&self) -> &TypeRef {
        match self {
            Place::Local(_, ty) | Place::Field(_, ty) | Place::Static(_, ty) => ty,
        }
    }

    fn load(&self) -> ir::Expr {
        match self {
            Place::Local(slot, _) => ir::Expr::Local(*slot),
            Place::Field(slot, _) => ir::Expr::Field(*slot),
            Place::Static(slot, _) => ir::Expr::Static(*slot),
        }
    }

    fn store(&self, value: ir::Expr) -> ir::Expr {
        let value = Box::new(value);
        match self {
            Place::Local(slot, _) => ir::Expr::StoreLocal(*slot, value),
            Place::Field(slot, _) => ir::Expr::StoreField(*slot, value),
            Place::Static(slot, _) => ir::Expr::StoreStatic(*slot, value),
        }
    }
}

fn error_expr() -> (ir::Expr, Ty) {
    (ir::Expr::Const(Constant::Null), Ty::Error)
}

fn convert(target: TypeRef, expr: ir::Expr) -> ir::Expr {
    ir::Expr::Cast {
        target,
        mode: CastMode::Convert,
        expr: Box::new(expr),
    }
}

/// Default value expression of a type.
pub(crate) fn default_value(ty: &TypeRef) -> ir::Expr {
    match ty {
        TypeRef::Primitive(kind) => match kind {
            PrimitiveKind::Boolean => ir::Expr::Const(Constant::Bool(false)),
            PrimitiveKind::Char => ir::Expr::Const(Constant::Char('\0')),
            PrimitiveKind::Int => ir::Expr::Const(Constant::Int(0)),
            PrimitiveKind::Long => ir::Expr::Const(Constant::Long(0)),
            PrimitiveKind::Float => ir::Expr::Const(Constant::Float(0.0)),
            PrimitiveKind::Double => ir::Expr::Const(Constant::Double(0.0)),
            PrimitiveKind::Byte | PrimitiveKind::Short => {
                convert(ty.clone(), ir::Expr::Const(Constant::Int(0)))
            }
        },
        _ => ir::Expr::Const(Constant::Null),
    }
}

/// Whether execution can fall off the end of `stmt`.
pub(crate) fn completes_normally(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return { .. } | Stmt::Throw { .. } => false,
        Stmt::Block(block) => block_completes_normally(block),
        Stmt::If {
            then_branch,
            else_branch: Some(else_branch),
            ..
        } => completes_normally(then_branch) || completes_normally(else_branch),
        Stmt::While { condition, .. } => {
            !matches!(condition.kind, ExprKind::Literal(Literal::Bool(true)))
        }
        _ => true,
    }
}

pub(crate) fn block_completes_normally(block: &Block) -> bool {
    block.statements.iter().all(completes_normally)
}

/// Lowers one method, constructor or initializer.
pub(crate) struct BodyLowering<'c, 'a> {
    ctx: &'c ClassContext<'a>,
    diagnostics: &'c mut Vec<Diagnostic>,
    kind: BodyKind,
    scopes: Vec<FxHashMap<String, Local>>,
    next_slot: usize,
}

impl<'c, 'a> BodyLowering<'c, 'a> {
    pub fn new(ctx: &'c ClassContext<'a>, diagnostics: &'c mut Vec<Diagnostic>, kind: BodyKind) -> Self {
        Self {
            ctx,
            diagnostics,
            kind,
            scopes: vec![FxHashMap::default()],
            next_slot: 0,
        }
    }

    /// Number of local slots used so far.
    pub fn locals(&self) -> usize {
        self.next_slot
    }

    fn error(&mut self, message: impl Into<String>, span: Span) {
        self.diagnostics.push(Diagnostic::new(message, span));
    }

    fn is_static_context(&self) -> bool {
        matches!(self.kind, BodyKind::StaticInit)
    }

    /// Bind parameters to slots `0..n`.
    pub fn declare_params(&mut self, params: &[Param], types: &[TypeRef]) {
        for (param, ty) in params.iter().zip(types) {
            self.declare(&param.name, ty.clone(), param.span);
        }
    }

    fn declare(&mut self, name: &str, ty: TypeRef, span: Span) -> usize {
        if self.scopes.iter().any(|scope| scope.contains_key(name)) {
            self.error(format!("variable {} is already defined", name), span);
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Local { slot, ty });
        }
        slot
    }

    fn lookup_local(&self, name: &str) -> Option<&Local> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn lower_block(&mut self, block: &Block) -> Vec<ir::Stmt> {
        self.scopes.push(FxHashMap::default());
        let mut out = Vec::new();
        for stmt in &block.statements {
            self.lower_stmt(stmt, &mut out);
        }
        self.scopes.pop();
        out
    }

    /// Lower a nested statement in its own scope.
    fn lower_nested(&mut self, stmt: &Stmt) -> Vec<ir::Stmt> {
        self.scopes.push(FxHashMap::default());
        let mut out = Vec::new();
        self.lower_stmt(stmt, &mut out);
        self.scopes.pop();
        out
    }

    fn lower_stmt(&mut self, stmt: &Stmt, out: &mut Vec<ir::Stmt>) {
        match stmt {
            Stmt::Block(block) => out.push(ir::Stmt::Block(self.lower_block(block))),
            Stmt::Empty(_) => {}
            Stmt::Expr(expr) => {
                let (lowered, _) = self.lower_expr(expr);
                out.push(ir::Stmt::Expr(lowered));
            }
            Stmt::Local {
                ty,
                name,
                init,
                span,
            } => {
                let ty = match self.ctx.scope.resolve(ty) {
                    Ok(ty) => ty,
                    Err(d) => {
                        self.diagnostics.push(d);
                        TypeRef::object()
                    }
                };
                let value = match init {
                    Some(init) => self.lower_as(init, &ty),
                    None => default_value(&ty),
                };
                let slot = self.declare(name, ty, *span);
                out.push(ir::Stmt::Expr(ir::Expr::StoreLocal(slot, Box::new(value))));
            }
            Stmt::Return { value, span } => {
                let lowered = self.lower_return(value.as_ref(), *span);
                out.push(ir::Stmt::Return(lowered));
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition = self.lower_condition(condition);
                let then_branch = self.lower_nested(then_branch);
                let else_branch = match else_branch {
                    Some(stmt) => self.lower_nested(stmt),
                    None => Vec::new(),
                };
                out.push(ir::Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                });
            }
            Stmt::While {
                condition, body, ..
            } => {
                let condition = self.lower_condition(condition);
                let body = self.lower_nested(body);
                out.push(ir::Stmt::While { condition, body });
            }
            Stmt::Throw { value, span } => {
                let (lowered, ty) = self.lower_expr(value);
                if ty == Ty::Void {
                    self.error("'void' type not allowed here", *span);
                }
                out.push(ir::Stmt::Throw(lowered));
            }
        }
    }

    fn lower_return(&mut self, value: Option<&Expr>, span: Span) -> Option<ir::Expr> {
        let expected = match &self.kind {
            BodyKind::Method(ty) => ty.clone(),
            _ => TypeRef::Void,
        };
        match (value, expected.is_void()) {
            (None, true) => None,
            (None, false) => {
                self.error("missing return value", span);
                None
            }
            (Some(value), true) => {
                let message = match self.kind {
                    BodyKind::Method(_) => "incompatible types: unexpected return value",
                    _ => "cannot return a value from a constructor or initializer",
                };
                self.error(message, value.span);
                None
            }
            (Some(value), false) => Some(self.lower_as(value, &expected)),
        }
    }

    fn lower_condition(&mut self, condition: &Expr) -> ir::Expr {
        let (lowered, ty) = self.lower_expr(condition);
        if !ty.is_boolean() {
            self.error(
                format!("incompatible types: {} cannot be converted to boolean", ty),
                condition.span,
            );
        }
        lowered
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Lower `expr` where a value of type `target` is required.
    pub fn lower_as(&mut self, expr: &Expr, target: &TypeRef) -> ir::Expr {
        let (lowered, ty) = self.lower_expr(expr);
        self.coerce(lowered, &ty, target, expr.span)
    }

    fn coerce(&mut self, expr: ir::Expr, from: &Ty, to: &TypeRef, span: Span) -> ir::Expr {
        if let (Ty::Prim(PrimitiveKind::Int), TypeRef::Primitive(kind)) = (from, to) {
            if let ir::Expr::Const(Constant::Int(value)) = expr {
                if constant_fits(value, *kind) {
                    return convert(to.clone(), expr);
                }
            }
        }
        if !self.ctx.is_assignable(from, to) {
            self.error(
                format!("incompatible types: {} cannot be converted to {}", from, to),
                span,
            );
            return expr;
        }
        match (from, to) {
            (Ty::Prim(a), TypeRef::Primitive(b)) if a != b => convert(to.clone(), expr),
            _ => expr,
        }
    }

    fn promote(&mut self, expr: ir::Expr, from: PrimitiveKind, to: PrimitiveKind) -> ir::Expr {
        if from == to {
            expr
        } else {
            convert(TypeRef::Primitive(to), expr)
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn lower_expr(&mut self, expr: &Expr) -> (ir::Expr, Ty) {
        match &expr.kind {
            ExprKind::Literal(literal) => lower_literal(literal),
            ExprKind::Name(name) => match self.resolve_place(name, expr.span) {
                Some(place) => {
                    let ty = Ty::of(place.ty());
                    (place.load(), ty)
                }
                None => error_expr(),
            },
            ExprKind::This => {
                if self.is_static_context() {
                    self.error(
                        "non-static variable this cannot be referenced from a static context",
                        expr.span,
                    );
                    return error_expr();
                }
                (
                    ir::Expr::This,
                    Ty::Ref(TypeRef::named(self.ctx.info.name.clone())),
                )
            }
            ExprKind::FieldAccess { target, name } => {
                match self.field_place(target, name, expr.span) {
                    Some(place) => {
                        let ty = Ty::of(place.ty());
                        (place.load(), ty)
                    }
                    None => error_expr(),
                }
            }
            ExprKind::Call { target, name, args } => {
                self.lower_call(target.as_deref(), name, args, expr.span)
            }
            ExprKind::SuperCall { name, args } => self.lower_super_call(name, args, expr.span),
            ExprKind::Unary { op, operand } => self.lower_unary(*op, operand, expr.span),
            ExprKind::Binary { op, left, right } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                self.lower_binary(*op, left, right, expr.span)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.lower_condition(left);
                let right = self.lower_condition(right);
                let lowered = match op {
                    LogicalOp::And => ir::Expr::And(Box::new(left), Box::new(right)),
                    LogicalOp::Or => ir::Expr::Or(Box::new(left), Box::new(right)),
                };
                (lowered, Ty::boolean())
            }
            ExprKind::Assign { op, target, value } => {
                self.lower_assign(*op, target, value, expr.span)
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => self.lower_conditional(condition, then_expr, else_expr),
            ExprKind::Cast { ty, expr: operand } => self.lower_cast(ty, operand, expr.span),
        }
    }

    fn resolve_place(&mut self, name: &str, span: Span) -> Option<Place> {
        if let Some(local) = self.lookup_local(name) {
            return Some(Place::Local(local.slot, local.ty.clone()));
        }
        self.own_field(name, span)
    }

    fn own_field(&mut self, name: &str, span: Span) -> Option<Place> {
        let Some(field) = self.ctx.field(name) else {
            self.error(format!("cannot find symbol: variable {}", name), span);
            return None;
        };
        if field.is_static {
            return Some(Place::Static(field.slot, field.ty.clone()));
        }
        if self.is_static_context() {
            self.error(
                format!(
                    "non-static variable {} cannot be referenced from a static context",
                    name
                ),
                span,
            );
            return None;
        }
        Some(Place::Field(field.slot, field.ty.clone()))
    }

    fn field_place(&mut self, target: &Expr, name: &str, span: Span) -> Option<Place> {
        if !matches!(target.kind, ExprKind::This) {
            self.error(
                format!("cannot access field {}: only fields of this are accessible", name),
                span,
            );
            return None;
        }
        if self.is_static_context() {
            self.error(
                "non-static variable this cannot be referenced from a static context",
                target.span,
            );
            return None;
        }
        self.own_field(name, span)
    }

    fn assignment_place(&mut self, target: &Expr) -> Option<Place> {
        let place = match &target.kind {
            ExprKind::Name(name) => self.resolve_place(name, target.span)?,
            ExprKind::FieldAccess {
                target: inner,
                name,
            } => self.field_place(inner, name, target.span)?,
            _ => {
                self.error("unexpected assignment target", target.span);
                return None;
            }
        };
        let name = match &target.kind {
            ExprKind::Name(name) | ExprKind::FieldAccess { name, .. } => name.as_str(),
            _ => "",
        };
        let final_static = match place {
            Place::Local(..) => None,
            _ => self
                .ctx
                .field(name)
                .filter(|f| f.is_final)
                .map(|f| f.is_static),
        };
        if let Some(is_static) = final_static {
            let allowed = match self.kind {
                BodyKind::Constructor | BodyKind::InstanceInit => !is_static,
                BodyKind::StaticInit => is_static,
                BodyKind::Method(_) => false,
            };
            if !allowed {
                self.error(
                    format!("cannot assign a value to final variable {}", name),
                    target.span,
                );
            }
        }
        Some(place)
    }

    fn lower_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr, span: Span) -> (ir::Expr, Ty) {
        let Some(place) = self.assignment_place(target) else {
            self.lower_expr(value);
            return error_expr();
        };
        let target_ty = place.ty().clone();
        let stored = match op {
            AssignOp::Assign => self.lower_as(value, &target_ty),
            AssignOp::Compound(op) => {
                let current = (place.load(), Ty::of(&target_ty));
                let value = self.lower_expr(value);
                let (combined, ty) = self.lower_binary(op, current, value, span);
                match (&ty, &target_ty) {
                    (Ty::Prim(a), TypeRef::Primitive(b)) if a != b => {
                        convert(target_ty.clone(), combined)
                    }
                    _ => self.coerce(combined, &ty, &target_ty, span),
                }
            }
        };
        (place.store(stored), Ty::of(&target_ty))
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &Expr, span: Span) -> (ir::Expr, Ty) {
        let (lowered, ty) = self.lower_expr(operand);
        if ty.is_error() {
            return error_expr();
        }
        match op {
            UnaryOp::Not => {
                if !ty.is_boolean() {
                    self.error(format!("bad operand type {} for unary operator '!'", ty), span);
                    return error_expr();
                }
                (
                    ir::Expr::Unary(ir::UnaryOp::Not, Box::new(lowered)),
                    Ty::boolean(),
                )
            }
            UnaryOp::Negate | UnaryOp::Plus => {
                let Some(kind) = ty.numeric() else {
                    let symbol = if op == UnaryOp::Negate { '-' } else { '+' };
                    self.error(
                        format!("bad operand type {} for unary operator '{}'", ty, symbol),
                        span,
                    );
                    return error_expr();
                };
                let promoted = kind.promoted();
                let operand = self.promote(lowered, kind, promoted);
                let lowered = if op == UnaryOp::Negate {
                    ir::Expr::Unary(ir::UnaryOp::Negate, Box::new(operand))
                } else {
                    operand
                };
                (lowered, Ty::Prim(promoted))
            }
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        (left, left_ty): (ir::Expr, Ty),
        (right, right_ty): (ir::Expr, Ty),
        span: Span,
    ) -> (ir::Expr, Ty) {
        if left_ty.is_error() || right_ty.is_error() {
            return error_expr();
        }
        let bad_operands = |this: &mut Self| {
            this.error(
                format!(
                    "bad operand types for binary operator '{}': {} and {}",
                    op, left_ty, right_ty
                ),
                span,
            );
            error_expr()
        };

        if op == BinaryOp::Add && (left_ty.is_string() || right_ty.is_string()) {
            if left_ty == Ty::Void || right_ty == Ty::Void {
                return bad_operands(self);
            }
            return (
                ir::Expr::Binary(op, Box::new(left), Box::new(right)),
                Ty::string(),
            );
        }

        if let (Some(a), Some(b)) = (left_ty.numeric(), right_ty.numeric()) {
            let promoted = a.promote_with(b);
            let left = self.promote(left, a, promoted);
            let right = self.promote(right, b, promoted);
            let ty = if op.is_comparison() {
                Ty::boolean()
            } else {
                Ty::Prim(promoted)
            };
            return (ir::Expr::Binary(op, Box::new(left), Box::new(right)), ty);
        }

        if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let both_boolean = left_ty == Ty::boolean() && right_ty == Ty::boolean();
            let both_references = left_ty.is_reference() && right_ty.is_reference();
            if both_boolean || both_references {
                return (
                    ir::Expr::Binary(op, Box::new(left), Box::new(right)),
                    Ty::boolean(),
                );
            }
            self.error(
                format!("incomparable types: {} and {}", left_ty, right_ty),
                span,
            );
            return error_expr();
        }

        bad_operands(self)
    }

    fn lower_conditional(&mut self, condition: &Expr, then_expr: &Expr, else_expr: &Expr) -> (ir::Expr, Ty) {
        let condition = self.lower_condition(condition);
        let (then_lowered, then_ty) = self.lower_expr(then_expr);
        let (else_lowered, else_ty) = self.lower_expr(else_expr);

        let (then_lowered, else_lowered, ty) = match (&then_ty, &else_ty) {
            (a, b) if a == b => (then_lowered, else_lowered, then_ty.clone()),
            (Ty::Error, _) | (_, Ty::Error) => (then_lowered, else_lowered, Ty::Error),
            (Ty::Prim(a), Ty::Prim(b)) if a.is_numeric() && b.is_numeric() => {
                let promoted = a.promote_with(*b);
                (
                    self.promote(then_lowered, *a, promoted),
                    self.promote(else_lowered, *b, promoted),
                    Ty::Prim(promoted),
                )
            }
            (Ty::Null, other) | (other, Ty::Null) if other.is_reference() => {
                let ty = other.clone();
                (then_lowered, else_lowered, ty)
            }
            (Ty::Void, _) | (_, Ty::Void) => {
                self.error("'void' type not allowed here", then_expr.span);
                (then_lowered, else_lowered, Ty::Error)
            }
            _ => (then_lowered, else_lowered, Ty::object()),
        };
        (
            ir::Expr::Conditional(
                Box::new(condition),
                Box::new(then_lowered),
                Box::new(else_lowered),
            ),
            ty,
        )
    }

    fn lower_cast(&mut self, ty: &ast::TypeName, operand: &Expr, span: Span) -> (ir::Expr, Ty) {
        let target = match self.ctx.scope.resolve(ty) {
            Ok(target) => target,
            Err(d) => {
                self.diagnostics.push(d);
                self.lower_expr(operand);
                return error_expr();
            }
        };
        let (lowered, from) = self.lower_expr(operand);
        let mode = match (&from, &target) {
            (Ty::Error, _) => CastMode::Check,
            (Ty::Void, _) => {
                self.error("'void' type not allowed here", operand.span);
                return error_expr();
            }
            (Ty::Prim(a), TypeRef::Primitive(b)) => {
                if a.is_numeric() != b.is_numeric() {
                    self.error(
                        format!("incompatible types: {} cannot be converted to {}", a, b),
                        span,
                    );
                    return error_expr();
                }
                CastMode::Convert
            }
            (Ty::Prim(_), TypeRef::Named(name)) if name == OBJECT => CastMode::Convert,
            (Ty::Prim(a), _) => {
                self.error(
                    format!("incompatible types: {} cannot be converted to {}", a, target),
                    span,
                );
                return error_expr();
            }
            (Ty::Null, TypeRef::Primitive(kind)) => {
                self.error(
                    format!("incompatible types: <null> cannot be converted to {}", kind),
                    span,
                );
                return error_expr();
            }
            _ => CastMode::Check,
        };
        (
            ir::Expr::Cast {
                target: target.clone(),
                mode,
                expr: Box::new(lowered),
            },
            Ty::of(&target),
        )
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn lower_args(&mut self, args: &[Expr]) -> Vec<(ir::Expr, Ty, Span)> {
        args.iter()
            .map(|arg| {
                let (lowered, ty) = self.lower_expr(arg);
                (lowered, ty, arg.span)
            })
            .collect()
    }

    fn accepts(&self, params: &[TypeRef], args: &[(ir::Expr, Ty, Span)]) -> bool {
        params.len() == args.len()
            && params
                .iter()
                .zip(args)
                .all(|(param, (_, ty, _))| self.ctx.is_assignable(ty, param))
    }

    fn select<'m>(
        &self,
        candidates: &'m [MethodSig],
        name: &str,
        args: &[(ir::Expr, Ty, Span)],
    ) -> Option<&'m MethodSig> {
        candidates
            .iter()
            .filter(|m| m.name == name && !m.is_static)
            .find(|m| self.accepts(&m.params, args))
    }

    fn coerce_args(&mut self, params: &[TypeRef], args: Vec<(ir::Expr, Ty, Span)>) -> Vec<ir::Expr> {
        args.into_iter()
            .enumerate()
            .map(|(i, (expr, ty, span))| match params.get(i) {
                Some(param) => self.coerce(expr, &ty, param, span),
                None => {
                    if ty == Ty::Void {
                        self.error("'void' type not allowed here", span);
                    }
                    expr
                }
            })
            .collect()
    }

    fn describe_args(args: &[(ir::Expr, Ty, Span)]) -> String {
        args.iter()
            .map(|(_, ty, _)| ty.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn lower_call(&mut self, target: Option<&Expr>, name: &str, args: &[Expr], span: Span) -> (ir::Expr, Ty) {
        let (receiver, receiver_ty) = match target {
            Some(target) => self.lower_expr(target),
            None => {
                if self.is_static_context() {
                    self.error(
                        format!(
                            "non-static method {} cannot be referenced from a static context",
                            name
                        ),
                        span,
                    );
                    return error_expr();
                }
                (
                    ir::Expr::This,
                    Ty::Ref(TypeRef::named(self.ctx.info.name.clone())),
                )
            }
        };
        let args = self.lower_args(args);
        match &receiver_ty {
            Ty::Error => return error_expr(),
            Ty::Ref(_) => {}
            other => {
                self.error(format!("{} cannot be dereferenced", other), span);
                return error_expr();
            }
        }

        let declared = match receiver_ty.named() {
            Some(type_name) if !BUILTIN_TYPES.contains(&type_name) => {
                let candidates = self.ctx.methods_of(type_name);
                self.select(&candidates, name, &args)
                    .map(|m| (m.params.clone(), m.return_type.clone()))
            }
            _ => None,
        };
        let (params, return_type) = match declared {
            Some((params, ret)) => (params, Ty::of(&ret)),
            None => match builtin_method(&receiver_ty, name, args.len()) {
                Some(sig) => {
                    let params: Vec<TypeRef> = sig.params.iter().map(Ty::to_type_ref).collect();
                    let fixed = &args[..params.len().min(args.len())];
                    let ok = (sig.varargs || params.len() == args.len())
                        && params.len() <= args.len()
                        && params
                            .iter()
                            .zip(fixed)
                            .all(|(p, (_, ty, _))| self.ctx.is_assignable(ty, p));
                    if !ok {
                        self.no_such_method(name, &receiver_ty, &args, span);
                        return error_expr();
                    }
                    (params, sig.return_type)
                }
                None => {
                    self.no_such_method(name, &receiver_ty, &args, span);
                    return error_expr();
                }
            },
        };
        let args = self.coerce_args(&params, args);
        (
            ir::Expr::Invoke {
                receiver: Box::new(receiver),
                method: name.to_string(),
                args,
            },
            return_type,
        )
    }

    fn no_such_method(&mut self, name: &str, receiver: &Ty, args: &[(ir::Expr, Ty, Span)], span: Span) {
        self.error(
            format!(
                "cannot find symbol: method {}({}) in {}",
                name,
                Self::describe_args(args),
                receiver
            ),
            span,
        );
    }

    fn lower_super_call(&mut self, name: &str, args: &[Expr], span: Span) -> (ir::Expr, Ty) {
        if self.is_static_context() {
            self.error(
                "non-static variable super cannot be referenced from a static context",
                span,
            );
            return error_expr();
        }
        let args = self.lower_args(args);
        let inherited = self.ctx.inherited_methods();
        let (params, return_type) = match self.select(&inherited, name, &args) {
            Some(method) if method.is_abstract => {
                self.error(
                    format!(
                        "abstract method {} in {} cannot be accessed directly",
                        method.signature(),
                        method.owner
                    ),
                    span,
                );
                return error_expr();
            }
            Some(method) => (method.params.clone(), Ty::of(&method.return_type)),
            None => match builtin_method(&Ty::object(), name, args.len()) {
                Some(sig) => (
                    sig.params.iter().map(Ty::to_type_ref).collect(),
                    sig.return_type,
                ),
                None => {
                    let superclass = Ty::Ref(TypeRef::named(self.ctx.info.superclass.clone()));
                    self.no_such_method(name, &superclass, &args, span);
                    return error_expr();
                }
            },
        };
        let args = self.coerce_args(&params, args);
        (
            ir::Expr::InvokeSuper {
                method: name.to_string(),
                args,
            },
            return_type,
        )
    }
}

fn lower_literal(literal: &Literal) -> (ir::Expr, Ty) {
    let (constant, ty) = match literal {
        Literal::Int(v) => (Constant::Int(*v), Ty::int()),
        Literal::Long(v) => (Constant::Long(*v), Ty::Prim(PrimitiveKind::Long)),
        Literal::Float(v) => (Constant::Float(*v), Ty::Prim(PrimitiveKind::Float)),
        Literal::Double(v) => (Constant::Double(*v), Ty::Prim(PrimitiveKind::Double)),
        Literal::Char(v) => (Constant::Char(*v), Ty::Prim(PrimitiveKind::Char)),
        Literal::String(v) => (Constant::Str(v.clone()), Ty::string()),
        Literal::Bool(v) => (Constant::Bool(*v), Ty::boolean()),
        Literal::Null => (Constant::Null, Ty::Null),
    };
    (ir::Expr::Const(constant), ty)
}

/// Whether an int constant can be narrowed to `kind` without loss.
fn constant_fits(value: i32, kind: PrimitiveKind) -> bool {
    match kind {
        PrimitiveKind::Byte => i8::try_from(value).is_ok(),
        PrimitiveKind::Short => i16::try_from(value).is_ok(),
        PrimitiveKind::Char => u16::try_from(value).is_ok(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::parser::Parser;

    fn block(source: &str) -> Block {
        let unit = Parser::new(&format!("class T {{ void m() {} }}", source))
            .unwrap()
            .parse()
            .unwrap();
        match &unit.class.members[0] {
            ast::Member::Method(method) => method.body.clone(),
            _ => panic!("expected method"),
        }
    }

    #[test]
    fn test_completes_normally() {
        assert!(block_completes_normally(&block("{ int x = 1; }")));
        assert!(!block_completes_normally(&block("{ return; }")));
        assert!(!block_completes_normally(&block("{ throw \"x\"; }")));
        assert!(!block_completes_normally(&block(
            "{ if (true) return; else throw \"x\"; }"
        )));
        assert!(block_completes_normally(&block("{ if (true) return; }")));
        assert!(!block_completes_normally(&block("{ while (true) { } }")));
        assert!(block_completes_normally(&block("{ boolean b = true; while (b) { } }")));
    }

    #[test]
    fn test_constant_fits() {
        assert!(constant_fits(127, PrimitiveKind::Byte));
        assert!(!constant_fits(128, PrimitiveKind::Byte));
        assert!(constant_fits(65535, PrimitiveKind::Char));
        assert!(!constant_fits(-1, PrimitiveKind::Char));
        assert!(!constant_fits(1, PrimitiveKind::Long));
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_value(&TypeRef::int()), ir::Expr::Const(Constant::Int(0)));
        assert_eq!(default_value(&TypeRef::string()), ir::Expr::Const(Constant::Null));
        assert!(matches!(
            default_value(&TypeRef::Primitive(PrimitiveKind::Short)),
            ir::Expr::Cast { mode: CastMode::Convert, .. }
        ));
    }
}
