//! `switch` statements and expressions.
//!
//! A switch statement becomes a `repeat .. until true` block so that `break`
//! leaves it; each section is an `if` over its compiled labels. A `continue`
//! that targets an enclosing loop sets a flag and breaks out, and the
//! `continue` is replayed after the block.
//!
//! A switch expression whose arms are all plain tests and pure values is a
//! single `if .. then .. else` expression. Anything else assigns one result
//! temporary.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{PatternKind, SwitchExprArm, SwitchLabel, SwitchSection};
use moon_ir::luau::{BinOp, Block, Expr, Stmt};
use moon_ir::{ExprId, Name, PatternId, Span, TypeId};

use super::Compiled;
use crate::control_flow::Frame;
use crate::lower::{terminates, Lowered, Lowerer};

/// One compiled arm of a switch expression.
struct Arm {
    compiled: Compiled,
    guard: Option<Lowered>,
    value: Lowered,
}

/// `<prereqs>; result = value`
fn assign_result(result: Name, value: Lowered) -> Vec<Stmt> {
    let mut body = value.prereqs;
    body.push(Stmt::assign(Expr::Ident(result), value.value));
    body
}

impl Arm {
    fn is_plain(&self) -> bool {
        self.guard.is_none() && self.compiled.bindings.is_empty() && !self.value.has_prereqs()
    }
}

impl Lowerer<'_> {
    /// `_` and `var x` match everything.
    fn is_catch_all(&self, pattern: PatternId) -> bool {
        matches!(
            self.arena.pattern(pattern).kind,
            PatternKind::Discard | PatternKind::Declaration { ty: None, .. }
        )
    }

    pub(crate) fn lower_switch_stmt(
        &mut self,
        subject: ExprId,
        sections: &[SwitchSection],
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let exhaustive = sections.iter().any(|section| {
            section.labels.iter().any(|label| match label {
                SwitchLabel::Default => true,
                SwitchLabel::Case { pattern, guard } => {
                    guard.present().is_none() && self.is_catch_all(*pattern)
                }
            })
        });
        if !exhaustive {
            return Err(LowerError::NonExhaustiveSwitch { span });
        }

        let (subject, ty) = self.match_subject(subject, out)?;
        tracing::trace!(sections = sections.len(), "lowering switch statement");

        let frame = Frame::Switch {
            continue_flag: None,
        };
        let (body, frame) = self.with_frame(frame, |this| {
            let mut body = Vec::new();
            let mut default = None;
            for section in sections {
                if section.labels.iter().any(|l| *l == SwitchLabel::Default) {
                    default = Some(section);
                } else {
                    this.lower_section(section, &subject, ty, &mut body)?;
                }
            }
            // `default` runs last wherever it is written.
            if let Some(section) = default {
                this.lower_stmt_list(this.arena.stmt_list(section.body), &mut body)?;
                if matches!(body.last(), Some(Stmt::Break)) {
                    body.pop();
                }
            }
            Ok(body)
        })?;

        let flag = match frame {
            Frame::Switch { continue_flag } => continue_flag,
            _ => None,
        };
        if let Some(flag) = flag {
            out.push(Stmt::local(flag, Expr::Bool(false)));
        }
        out.push(Stmt::Repeat {
            body: Block::new(body),
            until: Expr::Bool(true),
        });
        if let Some(flag) = flag {
            let replay = self.lower_continue(span)?;
            out.push(Stmt::if_then(Expr::Ident(flag), Block::new(replay)));
        }
        Ok(())
    }

    fn lower_section(
        &mut self,
        section: &SwitchSection,
        subject: &Expr,
        ty: TypeId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let mut labels = Vec::with_capacity(section.labels.len());
        for label in &section.labels {
            if let SwitchLabel::Case { pattern, guard } = label {
                let compiled = self.compile_pattern(*pattern, subject, ty)?;
                labels.push((compiled, guard.present()));
            }
        }

        let mut stmts = Vec::new();
        self.lower_stmt_list(self.arena.stmt_list(section.body), &mut stmts)?;
        if !terminates(&stmts) {
            stmts.push(Stmt::Break);
        }

        if let [(compiled, guard)] = labels.as_slice() {
            let mut block = Vec::new();
            Self::declare_bindings(compiled, &mut block);
            match guard {
                Some(guard) => {
                    let guard = self.expr_into(*guard, &mut block)?;
                    block.push(Stmt::if_then(guard, Block::new(stmts)));
                }
                None => block.extend(stmts),
            }
            if compiled.is_irrefutable() {
                out.push(Stmt::Do(Block::new(block)));
            } else {
                out.push(Stmt::if_then(compiled.test(), Block::new(block)));
            }
            return Ok(());
        }

        // Several labels share one body; none of them may bind.
        let mut tests = Vec::with_capacity(labels.len());
        for (compiled, guard) in labels {
            if !compiled.bindings.is_empty() {
                return Err(LowerError::unsupported(
                    "pattern variables in a multi-label switch section",
                    section.span,
                ));
            }
            let mut conditions = compiled.conditions;
            if let Some(guard) = guard {
                let Lowered { prereqs, value } = self.lower_expr(guard)?;
                if !prereqs.is_empty() {
                    return Err(LowerError::unsupported(
                        "guard with side effects in a multi-label switch section",
                        section.span,
                    ));
                }
                conditions.push(value);
            }
            tests.push(super::conjunction(conditions));
        }
        let test = tests
            .into_iter()
            .reduce(|acc, t| Expr::binary(BinOp::Or, acc, t))
            .unwrap_or(Expr::Bool(false));
        out.push(Stmt::if_then(test, Block::new(stmts)));
        Ok(())
    }

    pub(crate) fn lower_switch_expr(
        &mut self,
        id: ExprId,
        subject: ExprId,
        arms: &[SwitchExprArm],
    ) -> LowerResult<Lowered> {
        let span = self.span(id);
        let Some(last) = arms
            .iter()
            .position(|arm| arm.guard.present().is_none() && self.is_catch_all(arm.pattern))
        else {
            return Err(LowerError::NonExhaustiveSwitch { span });
        };

        let mut pre = Vec::new();
        let (subject, ty) = self.match_subject(subject, &mut pre)?;

        // Arms after the first catch-all can never be reached.
        let mut compiled = Vec::with_capacity(last + 1);
        for arm in &arms[..=last] {
            let pattern = self.compile_pattern(arm.pattern, &subject, ty)?;
            let guard = match arm.guard.present() {
                Some(guard) => Some(self.lower_expr(guard)?),
                None => None,
            };
            compiled.push(Arm {
                compiled: pattern,
                guard,
                value: self.lower_expr(arm.value)?,
            });
        }

        if compiled.iter().all(Arm::is_plain) {
            let mut arms = compiled.into_iter().rev();
            let Some(fallback) = arms.next() else {
                return Err(LowerError::NonExhaustiveSwitch { span });
            };
            let value = arms.fold(fallback.value.value, |acc, arm| {
                Expr::if_else(arm.compiled.test(), arm.value.value, acc)
            });
            return Ok(Lowered::new(pre, value));
        }

        let result = self.fresh("result");
        pre.push(Stmt::local_uninit(vec![result]));

        if compiled.iter().any(|arm| arm.guard.is_some()) {
            let mut body = Vec::new();
            for arm in compiled {
                let irrefutable = arm.compiled.is_irrefutable();
                let test = arm.compiled.test();
                let mut block = Vec::new();
                Self::declare_bindings(&arm.compiled, &mut block);
                match arm.guard {
                    Some(Lowered { prereqs, value }) => {
                        block.extend(prereqs);
                        let mut then = assign_result(result, arm.value);
                        then.push(Stmt::Break);
                        block.push(Stmt::if_then(value, Block::new(then)));
                    }
                    None => {
                        let mut then = assign_result(result, arm.value);
                        then.push(Stmt::Break);
                        block.extend(then);
                    }
                }
                if irrefutable {
                    body.push(Stmt::Do(Block::new(block)));
                } else {
                    body.push(Stmt::if_then(test, Block::new(block)));
                }
            }
            pre.push(Stmt::Repeat {
                body: Block::new(body),
                until: Expr::Bool(true),
            });
            return Ok(Lowered::new(pre, Expr::Ident(result)));
        }

        let mut chain: Vec<(Expr, Block)> = Vec::new();
        let mut fallback = None;
        for arm in compiled {
            let mut block = Vec::new();
            Self::declare_bindings(&arm.compiled, &mut block);
            if arm.compiled.is_irrefutable() {
                block.extend(assign_result(result, arm.value));
                fallback = Some(Block::new(block));
                break;
            }
            let test = arm.compiled.test();
            block.extend(assign_result(result, arm.value));
            chain.push((test, Block::new(block)));
        }
        let mut chain = chain.into_iter();
        match chain.next() {
            Some((cond, then_block)) => pre.push(Stmt::If {
                cond,
                then_block,
                else_ifs: chain.collect(),
                else_block: fallback,
            }),
            None => pre.extend(fallback.map(|b| b.stmts).unwrap_or_default()),
        }
        Ok(Lowered::new(pre, Expr::Ident(result)))
    }
}
