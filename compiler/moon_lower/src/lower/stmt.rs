//! Statement lowering.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{ExprKind, LocalDecl, MethodBody, MethodDecl, StmtKind, UsingResource};
use moon_ir::luau::{BinOp, Binding, Block, Expr, Stmt};
use moon_ir::{ExprId, ExprRange, Name, StmtId, StmtRange};

use super::{lua_index, terminates, Callable, Lowered, Lowerer};
use crate::control_flow::generators::contains_yield;
use crate::control_flow::using::UsingBody;
use crate::control_flow::Frame;
use crate::stack::ensure_sufficient_stack;

/// `if not cond then break end`
fn break_unless(cond: Expr) -> Stmt {
    Stmt::if_then(cond.not(), Block::new(vec![Stmt::Break]))
}

impl Lowerer<'_> {
    pub(crate) fn lower_stmt(&mut self, id: StmtId, out: &mut Vec<Stmt>) -> LowerResult<()> {
        ensure_sufficient_stack(|| self.lower_stmt_kind(id, out))
    }

    /// Lower a statement used as a body. A source block contributes its
    /// statements directly.
    pub(crate) fn lower_block(&mut self, id: StmtId) -> LowerResult<Block> {
        let mut out = Vec::new();
        match &self.arena.stmt(id).kind {
            StmtKind::Block(range) => {
                self.lower_stmt_list(self.arena.stmt_list(*range), &mut out)?;
            }
            _ => self.lower_stmt(id, &mut out)?,
        }
        Ok(Block::new(out))
    }

    /// Lower statements in order. Stops after a statement that cannot fall
    /// through; a `using` declaration takes the rest of the list as its body.
    pub(crate) fn lower_stmt_list(&mut self, ids: &[StmtId], out: &mut Vec<Stmt>) -> LowerResult<()> {
        for (i, &id) in ids.iter().enumerate() {
            let stmt = self.arena.stmt(id);
            if let StmtKind::UsingDecl(decl) = &stmt.kind {
                let resource = UsingResource::Decl(decl.clone());
                return self.lower_using(&resource, UsingBody::Rest(&ids[i + 1..]), stmt.span, out);
            }
            self.lower_stmt(id, out)?;
            if terminates(out) {
                break;
            }
        }
        Ok(())
    }

    fn lower_stmt_kind(&mut self, id: StmtId, out: &mut Vec<Stmt>) -> LowerResult<()> {
        let stmt = self.arena.stmt(id);
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Expr(expr) => self.lower_expr_stmt(*expr, out),
            StmtKind::Local(decls) => {
                for decl in decls {
                    self.lower_local(decl, out)?;
                }
                Ok(())
            }
            StmtKind::Deconstruct { names, init } => self.lower_deconstruct(names, *init, true, out),
            StmtKind::Block(range) => {
                let mut inner = Vec::new();
                self.lower_stmt_list(self.arena.stmt_list(*range), &mut inner)?;
                if !inner.is_empty() {
                    out.push(Stmt::Do(Block::new(inner)));
                }
                Ok(())
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => self.lower_if(*cond, *then_branch, *else_branch, out),
            StmtKind::While { cond, body } => self.lower_while(*cond, *body, out),
            StmtKind::DoWhile { body, cond } => self.lower_do_while(*body, *cond, out),
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.lower_for(*init, *cond, *step, *body, out),
            StmtKind::ForEach {
                binding,
                source,
                body,
            } => self.lower_foreach(binding, *source, *body, span, out),
            StmtKind::Switch { subject, sections } => {
                self.lower_switch_stmt(*subject, sections, span, out)
            }
            StmtKind::Try {
                body,
                catches,
                finally,
            } => self.lower_try(*body, catches, *finally, span, out),
            StmtKind::Using { resource, body } => {
                let mut inner = Vec::new();
                self.lower_using(resource, UsingBody::Stmt(*body), span, &mut inner)?;
                out.push(Stmt::Do(Block::new(inner)));
                Ok(())
            }
            StmtKind::UsingDecl(decl) => {
                let resource = UsingResource::Decl(decl.clone());
                self.lower_using(&resource, UsingBody::Rest(&[]), span, out)
            }
            StmtKind::Return(value) => {
                let value = match value.present() {
                    Some(expr) => Some(self.expr_into(expr, out)?),
                    None => None,
                };
                let ret = self.lower_return(value);
                out.push(ret);
                Ok(())
            }
            StmtKind::Break => {
                let stmts = self.lower_break(span)?;
                out.extend(stmts);
                Ok(())
            }
            StmtKind::Continue => {
                let stmts = self.lower_continue(span)?;
                out.extend(stmts);
                Ok(())
            }
            StmtKind::YieldReturn(_) | StmtKind::YieldBreak => Err(LowerError::invalid_tree(
                "`yield` outside of an iterator body",
                span,
            )),
            StmtKind::Throw(value) => self.lower_throw(value.present(), span, out),
            StmtKind::LocalFunction(decl) => self.lower_local_function(decl, out),
            StmtKind::Empty => Ok(()),
        }
    }

    /// An expression evaluated for its effect.
    pub(crate) fn lower_expr_stmt(&mut self, id: ExprId, out: &mut Vec<Stmt>) -> LowerResult<()> {
        match &self.arena.expr(id).kind {
            ExprKind::Assign { target, value } => self.lower_assign_stmt(*target, *value, out),
            ExprKind::CompoundAssign { op, target, value } => {
                self.lower_compound_stmt(*op, *target, *value, out)
            }
            ExprKind::IncDec { op, target } => self.lower_incdec_stmt(*op, *target, out),
            ExprKind::ConditionalAccess { receiver, access } => {
                self.lower_conditional_access_stmt(*receiver, *access, out)
            }
            ExprKind::Invocation { .. } => self.lower_invocation_stmt(id, out),
            ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            } => {
                let cond = self.expr_into(*cond, out)?;
                let mut then_stmts = Vec::new();
                self.lower_expr_stmt(*then_value, &mut then_stmts)?;
                let mut else_stmts = Vec::new();
                self.lower_expr_stmt(*else_value, &mut else_stmts)?;
                out.push(Stmt::If {
                    cond,
                    then_block: Block::new(then_stmts),
                    else_ifs: Vec::new(),
                    else_block: (!else_stmts.is_empty()).then(|| Block::new(else_stmts)),
                });
                Ok(())
            }
            _ => {
                let value = self.expr_into(id, out)?;
                if value.is_call() {
                    out.push(Stmt::Expr(value));
                }
                Ok(())
            }
        }
    }

    fn lower_local(&mut self, decl: &LocalDecl, out: &mut Vec<Stmt>) -> LowerResult<()> {
        match decl.init.present() {
            Some(init) => {
                let value = self.expr_into(init, out)?;
                out.push(Stmt::local(decl.name, value));
            }
            None => out.push(Stmt::Local {
                bindings: vec![Binding::typed(decl.name, self.types.map(decl.ty))],
                values: Vec::new(),
            }),
        }
        Ok(())
    }

    /// `var (a, b) = init` / `(a, b) = init`
    pub(crate) fn lower_deconstruct(
        &mut self,
        names: &[Name],
        init: ExprId,
        declare: bool,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let literal = match &self.arena.expr(init).kind {
            ExprKind::Tuple(items) if self.arena.expr_list(*items).len() == names.len() => {
                Some(*items)
            }
            _ => None,
        };
        let values = match literal {
            Some(items) => self.ordered(self.arena.expr_list(items), out)?,
            None => {
                let value = self.expr_into(init, out)?;
                let tuple = self.spill(value, "tuple", out);
                (0..names.len())
                    .map(|i| tuple.clone().index(lua_index(i)))
                    .collect()
            }
        };
        out.push(if declare {
            Stmt::Local {
                bindings: names.iter().map(|&n| Binding::new(n)).collect(),
                values,
            }
        } else {
            Stmt::Assign {
                targets: names.iter().map(|&n| Expr::Ident(n)).collect(),
                values,
            }
        });
        Ok(())
    }

    // Branches

    fn lower_if(
        &mut self,
        cond: ExprId,
        then_branch: StmtId,
        else_branch: StmtId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let cond = self.expr_into(cond, out)?;
        let then_block = self.lower_block(then_branch)?;
        let else_block = match else_branch.present() {
            Some(stmt) => Some(self.lower_block(stmt)?),
            None => None,
        };

        // A lone nested `if` in the else branch becomes an `elseif` chain.
        let (else_ifs, else_block) = match else_block {
            Some(mut block) if block.stmts.len() == 1 && matches!(block.stmts[0], Stmt::If { .. }) => {
                match block.stmts.pop() {
                    Some(Stmt::If {
                        cond,
                        then_block,
                        else_ifs,
                        else_block,
                    }) => {
                        let mut chain = vec![(cond, then_block)];
                        chain.extend(else_ifs);
                        (chain, else_block)
                    }
                    _ => (Vec::new(), Some(block)),
                }
            }
            Some(block) if block.is_empty() => (Vec::new(), None),
            other => (Vec::new(), other),
        };

        out.push(Stmt::If {
            cond,
            then_block,
            else_ifs,
            else_block,
        });
        Ok(())
    }

    // Loops

    /// `while c do body end`, or with prerequisites in the condition:
    ///
    /// ```text
    /// while true do
    ///   <prereqs>
    ///   if not c then break end
    ///   body
    /// end
    /// ```
    fn lower_while(&mut self, cond: ExprId, body: StmtId, out: &mut Vec<Stmt>) -> LowerResult<()> {
        let Lowered { prereqs, value } = self.lower_expr(cond)?;
        if prereqs.is_empty() {
            let body = self.loop_body(body, Vec::new())?;
            out.push(Stmt::While { cond: value, body });
            return Ok(());
        }
        let mut prelude = prereqs;
        prelude.push(break_unless(value));
        let body = self.loop_body(body, prelude)?;
        out.push(Stmt::While {
            cond: Expr::Bool(true),
            body,
        });
        Ok(())
    }

    /// `repeat body until not c`; with prerequisites in the condition the
    /// check moves to the end of a `while true` loop and is replayed before
    /// every `continue`.
    fn lower_do_while(&mut self, body: StmtId, cond: ExprId, out: &mut Vec<Stmt>) -> LowerResult<()> {
        let Lowered { prereqs, value } = self.lower_expr(cond)?;
        if prereqs.is_empty() {
            let mut block = self.loop_body(body, Vec::new())?;
            // Body locals must not capture names the condition reads.
            if block.stmts.iter().any(|s| matches!(s, Stmt::Local { .. } | Stmt::LocalFunction { .. })) {
                block = Block::new(vec![Stmt::Do(block)]);
            }
            out.push(Stmt::Repeat {
                body: block,
                until: value.not(),
            });
            return Ok(());
        }

        let mut check = prereqs;
        check.push(break_unless(value));
        let frame = Frame::Loop {
            continue_prelude: check.clone(),
        };
        let (mut stmts, _) = self.with_frame(frame, |this| Ok(this.lower_block(body)?.stmts))?;
        if !terminates(&stmts) {
            stmts.extend(check);
        }
        out.push(Stmt::While {
            cond: Expr::Bool(true),
            body: Block::new(stmts),
        });
        Ok(())
    }

    /// C-style `for`:
    ///
    /// ```text
    /// do
    ///   <init>
    ///   while cond do
    ///     body
    ///     <step>
    ///   end
    /// end
    /// ```
    fn lower_for(
        &mut self,
        init: StmtRange,
        cond: ExprId,
        step: ExprRange,
        body: StmtId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let mut stmts = Vec::new();
        self.lower_stmt_list(self.arena.stmt_list(init), &mut stmts)?;

        let mut steps = Vec::new();
        for &expr in self.arena.expr_list(step) {
            self.lower_expr_stmt(expr, &mut steps)?;
        }

        let (cond, mut prelude) = match cond.present() {
            Some(cond) => {
                let Lowered { prereqs, value } = self.lower_expr(cond)?;
                if prereqs.is_empty() {
                    (value, Vec::new())
                } else {
                    let mut prelude = prereqs;
                    prelude.push(break_unless(value));
                    (Expr::Bool(true), prelude)
                }
            }
            None => (Expr::Bool(true), Vec::new()),
        };

        let frame = Frame::Loop {
            continue_prelude: steps.clone(),
        };
        let (block, _) = self.with_frame(frame, |this| this.lower_block(body))?;
        prelude.extend(block.stmts);
        if !terminates(&prelude) {
            prelude.extend(steps);
        }
        let loop_stmt = Stmt::While {
            cond,
            body: Block::new(prelude),
        };

        if stmts.is_empty() {
            out.push(loop_stmt);
        } else {
            stmts.push(loop_stmt);
            out.push(Stmt::Do(Block::new(stmts)));
        }
        Ok(())
    }

    // Functions

    /// `local function f(..) .. end`; async local functions are assigned
    /// after a forward declaration so the body can refer to itself.
    fn lower_local_function(&mut self, decl: &MethodDecl, out: &mut Vec<Stmt>) -> LowerResult<()> {
        let is_generator = match decl.body {
            MethodBody::Block(body) => contains_yield(self.arena, body),
            _ => false,
        };
        let mut func = self.lower_callable(Callable {
            params: &decl.params,
            body: decl.body,
            ret: decl.ret,
            is_generator,
            annotate_return: !decl.is_async && !is_generator,
        })?;
        func.type_params.clone_from(&decl.type_params);

        if decl.is_async {
            out.push(Stmt::local_uninit(vec![decl.name]));
            out.push(Stmt::assign(Expr::Ident(decl.name), self.wrap_async(func)));
        } else {
            out.push(Stmt::LocalFunction {
                name: decl.name,
                func,
            });
        }
        Ok(())
    }

    /// `x ~= nil`
    pub(crate) fn not_nil(value: Expr) -> Expr {
        Expr::binary(BinOp::NotEq, value, Expr::Nil)
    }
}
