//! Iterator methods (`yield return`) as region closures.
//!
//! A body that only yields constants becomes one table literal. Anything
//! else is cut at every `yield` into regions: closures that run until the
//! next yield and return `(nextRegion, value)`, or `nil` when done. The
//! runtime's `CS.Generator.new(firstRegion)` drives them. A region hands
//! control to another without yielding by tail-calling it (`return _r3()`).
//!
//! Loops that contain a yield are spread over regions too: a head region
//! tests the condition, the body continues into the head (or a step region),
//! and `break`/`continue` become jumps through a [`Frame::RegionLoop`].
//! Locals declared at region level live across yields, so they are hoisted
//! to the generator function and assigned in place.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{ForEachBinding, StmtKind};
use moon_ir::luau::{BinOp, Block, CompoundOp, Expr, Function, Stmt, TableField, UnOp};
use moon_ir::{ExprId, Name, SourceArena, StmtId, TypeId};

use super::{jump, Frame};
use crate::lower::{lua_index, terminates, IterShape, Lowerer};
use crate::metadata::constant_value;

/// Whether `stmt` yields, not counting nested functions.
pub(crate) fn contains_yield(arena: &SourceArena, stmt: StmtId) -> bool {
    let any = |ids: &[StmtId]| ids.iter().any(|&s| contains_yield(arena, s));
    let opt = |id: StmtId| id.present().is_some_and(|s| contains_yield(arena, s));
    match &arena.stmt(stmt).kind {
        StmtKind::YieldReturn(_) | StmtKind::YieldBreak => true,
        StmtKind::Block(range) => any(arena.stmt_list(*range)),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => contains_yield(arena, *then_branch) || opt(*else_branch),
        StmtKind::While { body, .. }
        | StmtKind::DoWhile { body, .. }
        | StmtKind::ForEach { body, .. }
        | StmtKind::Using { body, .. } => contains_yield(arena, *body),
        StmtKind::For { init, body, .. } => {
            any(arena.stmt_list(*init)) || contains_yield(arena, *body)
        }
        StmtKind::Switch { sections, .. } => sections
            .iter()
            .any(|section| any(arena.stmt_list(section.body))),
        StmtKind::Try {
            body,
            catches,
            finally,
        } => {
            contains_yield(arena, *body)
                || catches.iter().any(|c| contains_yield(arena, c.body))
                || opt(*finally)
        }
        StmtKind::Expr(_)
        | StmtKind::Local(_)
        | StmtKind::Deconstruct { .. }
        | StmtKind::UsingDecl(_)
        | StmtKind::Return(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Throw(_)
        | StmtKind::LocalFunction(_)
        | StmtKind::Empty => false,
    }
}

/// Regions and hoisted locals of one generator body.
#[derive(Default)]
struct Regions {
    names: Vec<Name>,
    bodies: Vec<Option<Vec<Stmt>>>,
    hoisted: Vec<Name>,
    done: Option<Name>,
}

impl Regions {
    fn hoist(&mut self, name: Name) {
        if !self.hoisted.contains(&name) {
            self.hoisted.push(name);
        }
    }

    fn define(&mut self, region: Name, body: Vec<Stmt>) {
        if let Some(index) = self.names.iter().position(|&n| n == region) {
            self.bodies[index] = Some(body);
        }
    }
}

impl Lowerer<'_> {
    fn new_region(&mut self, regions: &mut Regions) -> Name {
        let name = self
            .interner
            .intern_owned(format!("_r{}", regions.names.len() + 1));
        regions.names.push(name);
        regions.bodies.push(None);
        name
    }

    /// The region that just finishes the iteration.
    fn done_region(&mut self, regions: &mut Regions) -> Name {
        if let Some(done) = regions.done {
            return done;
        }
        let done = self.new_region(regions);
        regions.define(done, vec![Stmt::ret(Expr::Nil)]);
        regions.done = Some(done);
        done
    }

    /// Statements of a block, or the statement itself.
    fn items(&self, stmt: StmtId) -> Vec<StmtId> {
        match &self.arena.stmt(stmt).kind {
            StmtKind::Block(range) => self.arena.stmt_list(*range).to_vec(),
            _ => vec![stmt],
        }
    }

    /// Lower the body of an iterator method.
    pub(crate) fn lower_generator(&mut self, body: StmtId, ret: TypeId) -> LowerResult<Block> {
        let stmts = self.items(body);
        if let Some(values) = self.constant_yields(&stmts) {
            tracing::trace!(count = values.len(), "generator lowered to a table");
            let table = Expr::Table(values.into_iter().map(TableField::Positional).collect());
            return Ok(Block::new(vec![Stmt::ret(table)]));
        }

        let mut regions = Regions::default();
        let entry = self.new_region(&mut regions);
        let entry_body = self.region_seq(&mut regions, &stmts, None)?;
        regions.define(entry, entry_body);
        tracing::trace!(regions = regions.names.len(), ?ret, "generator lowered to regions");

        let mut out = Vec::new();
        if !regions.hoisted.is_empty() {
            out.push(Stmt::local_uninit(regions.hoisted.clone()));
        }
        out.push(Stmt::local_uninit(regions.names.clone()));
        for (name, body) in regions.names.iter().zip(regions.bodies) {
            let func = Function {
                body: Block::new(body.unwrap_or_default()),
                ..Function::default()
            };
            out.push(Stmt::assign(Expr::Ident(*name), Expr::function(func)));
        }
        let generator = self
            .cs(self.names.generator)
            .member(self.names.new)
            .call(vec![Expr::Ident(entry)]);
        out.push(Stmt::ret(generator));
        Ok(Block::new(out))
    }

    /// The yielded values if the body is nothing but `yield return <const>`.
    fn constant_yields(&self, stmts: &[StmtId]) -> Option<Vec<Expr>> {
        if stmts.is_empty() {
            return None;
        }
        stmts
            .iter()
            .map(|&s| match &self.arena.stmt(s).kind {
                StmtKind::YieldReturn(value) => {
                    constant_value(self.arena, self.sema, self.interner, *value)
                }
                _ => None,
            })
            .collect()
    }

    /// Region for `rest` followed by `k`.
    fn continuation(
        &mut self,
        regions: &mut Regions,
        rest: &[StmtId],
        k: Option<Name>,
    ) -> LowerResult<Name> {
        if rest.is_empty() {
            return Ok(match k {
                Some(next) => next,
                None => self.done_region(regions),
            });
        }
        let region = self.new_region(regions);
        let body = self.region_seq(regions, rest, k)?;
        regions.define(region, body);
        Ok(region)
    }

    /// Lower `stmts` in region mode, continuing into `k` (or finishing).
    fn region_seq(
        &mut self,
        regions: &mut Regions,
        stmts: &[StmtId],
        k: Option<Name>,
    ) -> LowerResult<Vec<Stmt>> {
        let mut out = Vec::new();
        for (i, &id) in stmts.iter().enumerate() {
            let rest = &stmts[i + 1..];
            if !contains_yield(self.arena, id) {
                if self.region_plain(regions, id, rest, &mut out)? {
                    // A `using` declaration consumed the rest of the block.
                    break;
                }
                if terminates(&out) {
                    return Ok(out);
                }
                continue;
            }

            let span = self.arena.stmt(id).span;
            match self.arena.stmt(id).kind.clone() {
                StmtKind::YieldReturn(value) => {
                    let value = self.expr_into(value, &mut out)?;
                    let next = self.continuation(regions, rest, k)?;
                    out.push(Stmt::Return(vec![Expr::Ident(next), value]));
                }
                StmtKind::YieldBreak => out.push(Stmt::ret(Expr::Nil)),
                StmtKind::Block(range) => {
                    let mut joined = self.arena.stmt_list(range).to_vec();
                    joined.extend_from_slice(rest);
                    out.extend(self.region_seq(regions, &joined, k)?);
                }
                StmtKind::If {
                    cond,
                    then_branch,
                    else_branch,
                } => {
                    let after = self.continuation(regions, rest, k)?;
                    let cond = self.expr_into(cond, &mut out)?;
                    let then_items = self.items(then_branch);
                    let then_block = self.region_seq(regions, &then_items, Some(after))?;
                    let else_block = match else_branch.present() {
                        Some(else_branch) => {
                            let else_items = self.items(else_branch);
                            self.region_seq(regions, &else_items, Some(after))?
                        }
                        None => vec![jump(after)],
                    };
                    out.push(Stmt::If {
                        cond,
                        then_block: Block::new(then_block),
                        else_ifs: Vec::new(),
                        else_block: Some(Block::new(else_block)),
                    });
                }
                StmtKind::While { cond, body } => {
                    let after = self.continuation(regions, rest, k)?;
                    let head = self.new_region(regions);
                    let mut head_body = Vec::new();
                    let cond = self.expr_into(cond, &mut head_body)?;
                    head_body.push(Stmt::if_then(cond.not(), Block::new(vec![jump(after)])));
                    head_body.extend(self.region_loop_body(regions, body, after, head, head)?);
                    regions.define(head, head_body);
                    out.push(jump(head));
                }
                StmtKind::DoWhile { body, cond } => {
                    let after = self.continuation(regions, rest, k)?;
                    let body_region = self.new_region(regions);
                    let cond_region = self.new_region(regions);
                    let mut cond_body = Vec::new();
                    let cond = self.expr_into(cond, &mut cond_body)?;
                    cond_body.push(Stmt::if_then(cond, Block::new(vec![jump(body_region)])));
                    cond_body.push(jump(after));
                    regions.define(cond_region, cond_body);
                    let loop_body =
                        self.region_loop_body(regions, body, after, cond_region, cond_region)?;
                    regions.define(body_region, loop_body);
                    out.push(jump(body_region));
                }
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                } => {
                    for &init_stmt in self.arena.stmt_list(init) {
                        self.region_plain(regions, init_stmt, &[], &mut out)?;
                    }
                    let after = self.continuation(regions, rest, k)?;
                    let head = self.new_region(regions);
                    let step_region = self.new_region(regions);

                    let mut step_body = Vec::new();
                    for &step_expr in self.arena.expr_list(step) {
                        self.lower_expr_stmt(step_expr, &mut step_body)?;
                    }
                    step_body.push(jump(head));
                    regions.define(step_region, step_body);

                    let mut head_body = Vec::new();
                    if let Some(cond) = cond.present() {
                        let cond = self.expr_into(cond, &mut head_body)?;
                        head_body.push(Stmt::if_then(cond.not(), Block::new(vec![jump(after)])));
                    }
                    head_body.extend(self.region_loop_body(
                        regions,
                        body,
                        after,
                        step_region,
                        step_region,
                    )?);
                    regions.define(head, head_body);
                    out.push(jump(head));
                }
                StmtKind::ForEach {
                    binding,
                    source,
                    body,
                } => {
                    let after = self.continuation(regions, rest, k)?;
                    self.region_foreach(regions, &binding, source, body, after, &mut out)?;
                }
                StmtKind::Switch { .. } => {
                    return Err(LowerError::unsupported("`yield` inside a switch", span))
                }
                StmtKind::Try { .. } => {
                    return Err(LowerError::unsupported("`yield` inside a try block", span))
                }
                StmtKind::Using { .. } => {
                    return Err(LowerError::unsupported("`yield` inside a using block", span))
                }
                _ => {
                    return Err(LowerError::invalid_tree(
                        "statement reported a yield it cannot contain",
                        span,
                    ))
                }
            }
            return Ok(out);
        }

        out.push(match k {
            Some(next) => jump(next),
            None => Stmt::ret(Expr::Nil),
        });
        Ok(out)
    }

    /// Loop body continuing into `next`, with jumps resolved against the
    /// region loop.
    fn region_loop_body(
        &mut self,
        regions: &mut Regions,
        body: StmtId,
        exit: Name,
        next: Name,
        continue_to: Name,
    ) -> LowerResult<Vec<Stmt>> {
        let items = self.items(body);
        let frame = Frame::RegionLoop {
            exit,
            next: continue_to,
        };
        let (stmts, _) = self.with_frame(frame, |this| this.region_seq(regions, &items, Some(next)))?;
        Ok(stmts)
    }

    /// A statement without yields, at region level. Declared locals are
    /// hoisted. Returns whether the rest of the block was consumed.
    fn region_plain(
        &mut self,
        regions: &mut Regions,
        id: StmtId,
        rest: &[StmtId],
        out: &mut Vec<Stmt>,
    ) -> LowerResult<bool> {
        let stmt = self.arena.stmt(id);
        match &stmt.kind {
            StmtKind::Local(decls) => {
                for decl in decls {
                    regions.hoist(decl.name);
                    if let Some(init) = decl.init.present() {
                        let value = self.expr_into(init, out)?;
                        out.push(Stmt::assign(Expr::Ident(decl.name), value));
                    }
                }
                Ok(false)
            }
            StmtKind::Deconstruct { names, init } => {
                for &name in names {
                    regions.hoist(name);
                }
                self.lower_deconstruct(names, *init, false, out)?;
                Ok(false)
            }
            StmtKind::UsingDecl(_) => {
                if rest.iter().any(|&s| contains_yield(self.arena, s)) {
                    return Err(LowerError::unsupported(
                        "`yield` in the scope of a using declaration",
                        stmt.span,
                    ));
                }
                let mut scope = vec![id];
                scope.extend_from_slice(rest);
                self.lower_stmt_list(&scope, out)?;
                Ok(true)
            }
            _ => {
                self.lower_stmt(id, out)?;
                Ok(false)
            }
        }
    }

    /// `foreach` with a yield in its body, stepped by hand from a head region.
    fn region_foreach(
        &mut self,
        regions: &mut Regions,
        binding: &ForEachBinding,
        source: ExprId,
        body: StmtId,
        after: Name,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let head = self.new_region(regions);
        let mut head_body = Vec::new();
        let shape = self.iter_shape(source);
        let single = match binding {
            ForEachBinding::Single { name, .. } => Some(*name),
            ForEachBinding::Deconstruct(_) => None,
        };
        let bound = match binding {
            ForEachBinding::Single { name, .. } => vec![*name],
            ForEachBinding::Deconstruct(names) => names.clone(),
        };
        for &name in &bound {
            regions.hoist(name);
        }

        match shape {
            IterShape::Range { .. } | IterShape::EnumerableRange { .. } => {
                let var = single.unwrap_or_else(|| self.fresh("i"));
                regions.hoist(var);
                let Some(bounds) = self.numeric_bounds(shape, out)? else {
                    return Err(LowerError::invalid_tree(
                        "numeric foreach without bounds",
                        self.span(source),
                    ));
                };
                let last = self.hoisted_temp(regions, "last", bounds.last, out);
                out.push(Stmt::assign(Expr::Ident(var), bounds.start));
                let op = if bounds.descending { BinOp::Lt } else { BinOp::Gt };
                head_body.push(Stmt::if_then(
                    Expr::binary(op, Expr::Ident(var), last),
                    Block::new(vec![jump(after)]),
                ));
                let step_region = self.new_region(regions);
                regions.define(
                    step_region,
                    vec![
                        Stmt::CompoundAssign {
                            op: CompoundOp::Add,
                            target: Expr::Ident(var),
                            value: bounds.step,
                        },
                        jump(head),
                    ],
                );
                let loop_body =
                    self.region_loop_body(regions, body, after, step_region, step_region)?;
                head_body.extend(loop_body);
                regions.define(head, head_body);
                out.push(jump(head));
                return Ok(());
            }
            IterShape::Array | IterShape::String => {
                let items = self.expr_into(source, out)?;
                let items = self.hoisted_temp(regions, "items", items, out);
                let index = self.fresh("i");
                regions.hoist(index);
                out.push(Stmt::assign(Expr::Ident(index), Expr::int(0)));
                head_body.push(Stmt::CompoundAssign {
                    op: CompoundOp::Add,
                    target: Expr::Ident(index),
                    value: Expr::int(1),
                });
                head_body.push(Stmt::if_then(
                    Expr::binary(
                        BinOp::Gt,
                        Expr::Ident(index),
                        Expr::unary(UnOp::Len, items.clone()),
                    ),
                    Block::new(vec![jump(after)]),
                ));
                let element = if matches!(shape, IterShape::String) {
                    self.lib_call(
                        self.names.string,
                        self.names.sub,
                        vec![items, Expr::Ident(index), Expr::Ident(index)],
                    )
                } else {
                    items.index(Expr::Ident(index))
                };
                self.bind_element(binding, element, &mut head_body);
            }
            IterShape::Dictionary | IterShape::Set | IterShape::Opaque => {
                let items = self.expr_into(source, out)?;
                let items = self.hoisted_temp(regions, "items", items, out);
                let key = self.fresh("key");
                let value = self.fresh("value");
                regions.hoist(key);
                regions.hoist(value);
                out.push(Stmt::assign(Expr::Ident(key), Expr::Nil));
                head_body.push(Stmt::Assign {
                    targets: vec![Expr::Ident(key), Expr::Ident(value)],
                    values: vec![self.global_call(
                        self.names.next,
                        vec![items, Expr::Ident(key)],
                    )],
                });
                head_body.push(Stmt::if_then(
                    Expr::binary(BinOp::Eq, Expr::Ident(key), Expr::Nil),
                    Block::new(vec![jump(after)]),
                ));
                match (shape, binding) {
                    (IterShape::Dictionary, ForEachBinding::Deconstruct(names)) => {
                        head_body.push(Stmt::Assign {
                            targets: names.iter().map(|&n| Expr::Ident(n)).collect(),
                            values: vec![Expr::Ident(key), Expr::Ident(value)],
                        });
                    }
                    (IterShape::Dictionary, ForEachBinding::Single { name, .. }) => {
                        head_body.push(Stmt::assign(
                            Expr::Ident(*name),
                            self.key_value_pair(Expr::Ident(key), Expr::Ident(value)),
                        ));
                    }
                    (IterShape::Set, _) => self.bind_element(binding, Expr::Ident(key), &mut head_body),
                    _ => self.bind_element(binding, Expr::Ident(value), &mut head_body),
                }
            }
        }

        head_body.extend(self.region_loop_body(regions, body, after, head, head)?);
        regions.define(head, head_body);
        out.push(jump(head));
        Ok(())
    }

    /// Assign `value` to a hoisted temporary unless it is already simple.
    fn hoisted_temp(
        &mut self,
        regions: &mut Regions,
        base: &'static str,
        value: Expr,
        out: &mut Vec<Stmt>,
    ) -> Expr {
        if value.is_simple() {
            return value;
        }
        let temp = self.fresh(base);
        regions.hoist(temp);
        out.push(Stmt::assign(Expr::Ident(temp), value));
        Expr::Ident(temp)
    }

    /// Assign an element to the foreach variable(s) without declaring them.
    fn bind_element(&mut self, binding: &ForEachBinding, element: Expr, out: &mut Vec<Stmt>) {
        match binding {
            ForEachBinding::Single { name, .. } => out.push(Stmt::assign(Expr::Ident(*name), element)),
            ForEachBinding::Deconstruct(names) => {
                let item = self.spill(element, "item", out);
                out.push(Stmt::Assign {
                    targets: names.iter().map(|&n| Expr::Ident(n)).collect(),
                    values: (0..names.len())
                        .map(|i| item.clone().index(lua_index(i)))
                        .collect(),
                });
            }
        }
    }
}

