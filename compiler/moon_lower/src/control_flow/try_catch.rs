//! `try`/`catch`/`finally` as a `CS.try` call.
//!
//! ```text
//! local _exitKind, _exitValue = CS.try(function()
//!   ..body..
//! end, function(ex)
//!   ..catch..
//! end, function()
//!   ..finally..
//! end)
//! if _exitKind == CS.TRY_RETURN then
//!   return _exitValue
//! end
//! ```
//!
//! Only the exit kinds that actually occur in the closures are dispatched;
//! a try with none of them becomes a bare call statement.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::CatchClause;
use moon_ir::luau::{BinOp, Binding, Block, Expr, Function, Stmt};
use moon_ir::sema::WellKnownType;
use moon_ir::{Name, Span, StmtId, TypeId};

use super::{Frame, TryExits};
use crate::lower::Lowerer;

/// Third argument of `CS.try`.
pub(crate) enum Finally {
    None,
    Source(StmtId),
    Lowered(Block),
}

fn closure(params: Vec<Name>, body: Block) -> Expr {
    Expr::function(Function {
        params: params.into_iter().map(Binding::new).collect(),
        body,
        ..Function::default()
    })
}

fn merge(into: &mut TryExits, frame: Frame) {
    if let Frame::Try(exits) = frame {
        into.ret |= exits.ret;
        into.ret_value |= exits.ret_value;
        into.brk |= exits.brk;
        into.cont |= exits.cont;
    }
}

impl Lowerer<'_> {
    pub(crate) fn lower_try(
        &mut self,
        body: StmtId,
        catches: &[CatchClause],
        finally: StmtId,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        if let Some(second) = catches.get(1) {
            return Err(LowerError::unsupported(
                "more than one catch clause",
                second.span,
            ));
        }
        let finally = match finally.present() {
            Some(stmt) => Finally::Source(stmt),
            None => Finally::None,
        };
        self.emit_try_call(|this| this.lower_block(body), catches.first(), finally, span, out)
    }

    /// Emit the `CS.try` call and the dispatch of the exits it reports.
    pub(crate) fn emit_try_call(
        &mut self,
        body: impl FnOnce(&mut Self) -> LowerResult<Block>,
        catch: Option<&CatchClause>,
        finally: Finally,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let mut exits = TryExits::default();

        let (body, frame) = self.with_frame(Frame::Try(TryExits::default()), body)?;
        merge(&mut exits, frame);
        let mut args = vec![closure(Vec::new(), body)];

        if let Some(clause) = catch {
            let param = match clause.name {
                Some(name) => name,
                None => self.fresh("ex"),
            };
            self.catch_vars.push(param);
            let lowered = self.with_frame(Frame::Try(TryExits::default()), |this| {
                let mut stmts = Vec::new();
                stmts.extend(this.catch_filter(clause.ty, param));
                stmts.extend(this.lower_block(clause.body)?.stmts);
                Ok(Block::new(stmts))
            });
            self.catch_vars.pop();
            let (catch_body, frame) = lowered?;
            merge(&mut exits, frame);
            args.push(closure(vec![param], catch_body));
        } else if !matches!(finally, Finally::None) {
            args.push(Expr::Nil);
        }

        let finally_body = match finally {
            Finally::None => None,
            Finally::Lowered(block) => Some(block),
            Finally::Source(stmt) => {
                let (block, frame) =
                    self.with_frame(Frame::Try(TryExits::default()), |this| this.lower_block(stmt))?;
                merge(&mut exits, frame);
                Some(block)
            }
        };
        if let Some(block) = finally_body {
            args.push(closure(Vec::new(), block));
        }

        let call = self.cs_call(self.names.try_, args);
        if !exits.any() {
            out.push(Stmt::Expr(call));
            return Ok(());
        }

        let kind = self.fresh("exitKind");
        let value = exits.ret_value.then(|| self.fresh("exitValue"));
        let mut bindings = vec![Binding::new(kind)];
        bindings.extend(value.map(Binding::new));
        out.push(Stmt::Local {
            bindings,
            values: vec![call],
        });

        tracing::trace!(?exits, "dispatching try exits");
        if exits.ret {
            let ret = self.lower_return(value.map(Expr::Ident));
            out.push(self.exit_guard(kind, self.names.try_return, vec![ret]));
        }
        if exits.brk {
            let stmts = self.lower_break(span)?;
            out.push(self.exit_guard(kind, self.names.try_break, stmts));
        }
        if exits.cont {
            let stmts = self.lower_continue(span)?;
            out.push(self.exit_guard(kind, self.names.try_continue, stmts));
        }
        Ok(())
    }

    /// `if _exitKind == CS.TRY_X then ... end`
    fn exit_guard(&self, kind: Name, sentinel: Name, then: Vec<Stmt>) -> Stmt {
        Stmt::if_then(
            Expr::binary(BinOp::Eq, Expr::Ident(kind), self.cs(sentinel)),
            Block::new(then),
        )
    }

    /// Rethrow errors a typed catch clause does not handle.
    fn catch_filter(&self, ty: TypeId, param: Name) -> Option<Stmt> {
        if ty == TypeId::ERROR || ty == TypeId::OBJECT {
            return None;
        }
        let (symbol, type_sym) = self.sema.type_symbol_of(ty)?;
        if type_sym.well_known == Some(WellKnownType::Exception) {
            return None;
        }
        let test = self.cs_call(self.names.is, vec![Expr::Ident(param), self.type_expr(symbol)]);
        Some(Stmt::if_then(
            test.not(),
            Block::new(vec![Stmt::Expr(
                self.cs_call(self.names.throw, vec![Expr::Ident(param)]),
            )]),
        ))
    }

    /// `throw e` / `throw;`
    pub(crate) fn lower_throw(
        &mut self,
        value: Option<moon_ir::ExprId>,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let error = match value {
            Some(expr) => self.expr_into(expr, out)?,
            None => match self.catch_vars.last() {
                Some(&var) => Expr::Ident(var),
                None => {
                    return Err(LowerError::invalid_tree(
                        "rethrow outside of a catch clause",
                        span,
                    ))
                }
            },
        };
        out.push(Stmt::Expr(self.cs_call(self.names.throw, vec![error])));
        Ok(())
    }
}
