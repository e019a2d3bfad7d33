//! Invocations: methods, delegates, events and base calls.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::ExprKind;
use moon_ir::luau::{Expr, Stmt};
use moon_ir::sema::{Symbol, SymbolKind, WellKnownMember};
use moon_ir::{ExprId, ExprRange, SymbolId};

use super::{Lowered, Lowerer};

impl Lowerer<'_> {
    fn is_event(&self, expr: ExprId) -> bool {
        let symbol = match &self.arena.expr(expr).kind {
            ExprKind::Ident { symbol, .. } | ExprKind::Member { symbol, .. } => *symbol,
            _ => return false,
        };
        matches!(
            self.sema.symbol(symbol).map(|s| &s.kind),
            Some(SymbolKind::Event { .. })
        )
    }

    pub(crate) fn lower_invocation(
        &mut self,
        id: ExprId,
        callee: ExprId,
        args: ExprRange,
        method: SymbolId,
    ) -> LowerResult<Lowered> {
        let args = self.arena.expr_list(args);
        let method_sym = self.sema.symbol(method);
        let well_known = method_sym.and_then(Symbol::as_method).and_then(|m| m.well_known);

        if let Some(member) = well_known {
            if member == WellKnownMember::Invoke {
                if let ExprKind::Member { receiver, .. } = self.arena.expr(callee).kind {
                    return self.lower_delegate_call(receiver, args);
                }
            } else if let Some(lowered) = self.lower_builtin_call(member, id, callee, args)? {
                return Ok(lowered);
            }
        }

        let Some(sym) = method_sym.filter(|s| s.owner.is_some()) else {
            return self.lower_delegate_call(callee, args);
        };
        let Some(info) = sym.as_method() else {
            return self.lower_delegate_call(callee, args);
        };

        let mut pre = Vec::new();
        let value = match &self.arena.expr(callee).kind {
            ExprKind::Member { receiver, .. } => {
                let receiver = *receiver;
                match self.arena.expr(receiver).kind {
                    ExprKind::Base => {
                        let Some(base) = self.scope.and_then(|s| s.base) else {
                            return Err(LowerError::invalid_tree(
                                "`base` call without a base class",
                                self.span(callee),
                            ));
                        };
                        let (_, mut values) = self.lower_args(None, args, &mut pre)?;
                        values.insert(0, self.self_expr());
                        Expr::Ident(base).member(sym.name).call(values)
                    }
                    ExprKind::TypeRef(owner) => {
                        let (_, values) = self.lower_args(None, args, &mut pre)?;
                        self.type_expr(owner).member(sym.name).call(values)
                    }
                    _ if info.is_static && !info.is_extension => {
                        let (_, values) = self.lower_args(None, args, &mut pre)?;
                        self.implicit_receiver(sym).member(sym.name).call(values)
                    }
                    _ => {
                        let object = self.lower_receiver_lowered(receiver)?;
                        let (object, values) = self.lower_args(Some(object), args, &mut pre)?;
                        let object = object.unwrap_or_else(|| self.self_expr());
                        object.method_call(sym.name, values)
                    }
                }
            }
            _ => {
                let (_, values) = self.lower_args(None, args, &mut pre)?;
                if info.is_static {
                    self.implicit_receiver(sym).member(sym.name).call(values)
                } else {
                    self.self_expr().method_call(sym.name, values)
                }
            }
        };
        Ok(Lowered::new(pre, value))
    }

    /// The receiver as a [`Lowered`], so argument spilling can see it.
    pub(crate) fn lower_receiver_lowered(&mut self, receiver: ExprId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let value = self.lower_receiver(receiver, &mut pre)?;
        Ok(Lowered::new(pre, value))
    }

    /// `f(args)`, or `event:Fire(args)` when `f` is an event.
    fn lower_delegate_call(&mut self, callee: ExprId, args: &[ExprId]) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let target = self.lower_expr(callee)?;
        let (target, values) = self.lower_args(Some(target), args, &mut pre)?;
        let Some(target) = target else {
            return Err(LowerError::invalid_tree("call without a target", self.span(callee)));
        };
        let value = if self.is_event(callee) {
            target.method_call(self.names.fire, values)
        } else {
            target.call(values)
        };
        Ok(Lowered::new(pre, value))
    }

    /// A call whose value is discarded. Some library calls have a cheaper
    /// statement form than their value form.
    pub(crate) fn lower_invocation_stmt(
        &mut self,
        id: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        if let ExprKind::Invocation {
            callee,
            args,
            method,
        } = &self.arena.expr(id).kind
        {
            let well_known = self
                .sema
                .symbol(*method)
                .and_then(Symbol::as_method)
                .and_then(|m| m.well_known);
            if let Some(member) = well_known {
                let args = self.arena.expr_list(*args);
                if self.lower_builtin_stmt(member, *callee, args, out)? {
                    return Ok(());
                }
            }
        }
        let value = self.expr_into(id, out)?;
        if value.is_call() {
            out.push(Stmt::Expr(value));
        }
        Ok(())
    }
}
