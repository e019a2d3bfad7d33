//! `foreach` dispatch on the static shape of the source.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{ExprKind, ForEachBinding};
use moon_ir::luau::{BinOp, Binding, Block, Expr, Stmt, TableField, UnOp};
use moon_ir::sema::{TypeKind, WellKnownMember, WellKnownType};
use moon_ir::{ExprId, Name, Span, StmtId};

use super::{lua_index, Lowerer};
use crate::control_flow::Frame;

/// How a `foreach` source is iterated.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum IterShape {
    /// `start..end` with an optional step.
    Range {
        start: ExprId,
        end: ExprId,
        step: Option<ExprId>,
    },
    /// `Enumerable.Range(start, count)`
    EnumerableRange { start: ExprId, count: ExprId },
    /// Arrays and lists: index-value pairs.
    Array,
    Dictionary,
    /// Sets store their elements as keys.
    Set,
    /// One character at a time.
    String,
    /// Anything else: iterate the value itself.
    Opaque,
}

/// Header values of a numeric loop.
pub(crate) struct NumericBounds {
    pub start: Expr,
    /// Inclusive.
    pub last: Expr,
    pub step: Expr,
    pub descending: bool,
}

fn is_unit_step(step: &Expr) -> bool {
    matches!(step, Expr::Number(n) if (*n - 1.0).abs() < f64::EPSILON)
}

fn is_negative(step: &Expr) -> bool {
    match step {
        Expr::Number(n) => *n < 0.0,
        Expr::Unary {
            op: UnOp::Neg,
            operand,
        } => matches!(**operand, Expr::Number(n) if n > 0.0),
        _ => false,
    }
}

impl Lowerer<'_> {
    pub(crate) fn iter_shape(&self, source: ExprId) -> IterShape {
        let expr = self.arena.expr(source);
        match &expr.kind {
            ExprKind::Range { start, end, step } => {
                return IterShape::Range {
                    start: *start,
                    end: *end,
                    step: step.present(),
                }
            }
            ExprKind::Invocation { args, method, .. } => {
                let well_known = self
                    .sema
                    .symbol(*method)
                    .and_then(|s| s.as_method())
                    .and_then(|m| m.well_known);
                if let (Some(WellKnownMember::EnumerableRange), [start, count]) =
                    (well_known, self.arena.expr_list(*args))
                {
                    return IterShape::EnumerableRange {
                        start: *start,
                        count: *count,
                    };
                }
            }
            _ => {}
        }

        let ty = expr.ty;
        if self.sema.types.is_string(ty) {
            return IterShape::String;
        }
        if let TypeKind::Array(_) = self.sema.type_kind(self.sema.types.non_nullable(ty)) {
            return IterShape::Array;
        }
        match self.sema.well_known(ty) {
            Some(WellKnownType::List | WellKnownType::IList | WellKnownType::IReadOnlyList) => {
                IterShape::Array
            }
            Some(WellKnownType::Dictionary | WellKnownType::IDictionary) => IterShape::Dictionary,
            Some(WellKnownType::HashSet) => IterShape::Set,
            _ => IterShape::Opaque,
        }
    }

    /// Lowered bounds of a numeric shape; `None` for the others.
    pub(crate) fn numeric_bounds(
        &mut self,
        shape: IterShape,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<Option<NumericBounds>> {
        match shape {
            IterShape::Range { start, end, step } => {
                let mut ids = vec![start, end];
                ids.extend(step);
                let mut values = self.ordered(&ids, out)?.into_iter();
                let (Some(start), Some(last)) = (values.next(), values.next()) else {
                    return Ok(None);
                };
                let step = values.next().unwrap_or_else(|| Expr::int(1));
                let descending = is_negative(&step);
                Ok(Some(NumericBounds {
                    start,
                    last,
                    step,
                    descending,
                }))
            }
            IterShape::EnumerableRange { start, count } => {
                let mut values = self.ordered(&[start, count], out)?.into_iter();
                let (Some(start), Some(count)) = (values.next(), values.next()) else {
                    return Ok(None);
                };
                let start = self.spill(start, "start", out);
                let last = match (&start, &count) {
                    (Expr::Number(s), Expr::Number(c)) => Expr::Number(s + c - 1.0),
                    (_, count) if is_unit_step(count) => start.clone(),
                    (_, Expr::Number(c)) => {
                        Expr::binary(BinOp::Add, start.clone(), Expr::Number(c - 1.0))
                    }
                    _ => Expr::binary(
                        BinOp::Sub,
                        Expr::binary(BinOp::Add, start.clone(), count),
                        Expr::int(1),
                    ),
                };
                Ok(Some(NumericBounds {
                    start,
                    last,
                    step: Expr::int(1),
                    descending: false,
                }))
            }
            _ => Ok(None),
        }
    }

    /// `{ Key = key, Value = value }`
    pub(crate) fn key_value_pair(&self, key: Expr, value: Expr) -> Expr {
        Expr::Table(vec![
            TableField::Named(self.names.key, key),
            TableField::Named(self.names.value, value),
        ])
    }

    pub(crate) fn lower_foreach(
        &mut self,
        binding: &ForEachBinding,
        source: ExprId,
        body: StmtId,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let shape = self.iter_shape(source);
        tracing::trace!(?shape, "lowering foreach");

        if let Some(bounds) = self.numeric_bounds(shape, out)? {
            let ForEachBinding::Single { name, .. } = binding else {
                return Err(LowerError::invalid_tree(
                    "deconstructing foreach over a numeric range",
                    span,
                ));
            };
            let body = self.loop_body(body, Vec::new())?;
            out.push(Stmt::NumericFor {
                var: *name,
                start: bounds.start,
                end: bounds.last,
                step: (!is_unit_step(&bounds.step)).then_some(bounds.step),
                body,
            });
            return Ok(());
        }

        let iterable = self.expr_into(source, out)?;
        let (vars, iter, prelude) = match shape {
            IterShape::Array => {
                let (value, prelude) = self.element_binding(binding);
                let index = self.fresh("index");
                (
                    vec![index, value],
                    self.global_call(self.names.ipairs, vec![iterable]),
                    prelude,
                )
            }
            IterShape::Dictionary => {
                let pairs = self.global_call(self.names.pairs, vec![iterable]);
                match binding {
                    ForEachBinding::Deconstruct(names) => (names.clone(), pairs, Vec::new()),
                    ForEachBinding::Single { name, .. } => {
                        let key = self.fresh("key");
                        let value = self.fresh("value");
                        let pair = self.key_value_pair(Expr::Ident(key), Expr::Ident(value));
                        (vec![key, value], pairs, vec![Stmt::local(*name, pair)])
                    }
                }
            }
            IterShape::Set => {
                let (value, prelude) = self.element_binding(binding);
                (
                    vec![value],
                    self.global_call(self.names.pairs, vec![iterable]),
                    prelude,
                )
            }
            IterShape::String => {
                let (value, prelude) = self.element_binding(binding);
                let chars = self.lib_call(
                    self.names.string,
                    self.names.gmatch,
                    vec![iterable, Expr::string(".")],
                );
                (vec![value], chars, prelude)
            }
            IterShape::Opaque | IterShape::Range { .. } | IterShape::EnumerableRange { .. } => {
                let (value, prelude) = self.element_binding(binding);
                let index = self.fresh("index");
                let iter = if self.options.macros.enable_iterator_helpers {
                    self.cs_call(self.names.iter, vec![iterable])
                } else {
                    iterable
                };
                (vec![index, value], iter, prelude)
            }
        };

        let body = self.loop_body(body, prelude)?;
        out.push(Stmt::GenericFor {
            vars,
            iter: vec![iter],
            body,
        });
        Ok(())
    }

    /// Loop variable for one element, plus the statements that unpack it
    /// into a deconstructing binding.
    fn element_binding(&mut self, binding: &ForEachBinding) -> (Name, Vec<Stmt>) {
        match binding {
            ForEachBinding::Single { name, .. } => (*name, Vec::new()),
            ForEachBinding::Deconstruct(names) => {
                let item = self.fresh("item");
                let unpack = Stmt::Local {
                    bindings: names.iter().map(|&n| Binding::new(n)).collect(),
                    values: (0..names.len())
                        .map(|i| Expr::Ident(item).index(lua_index(i)))
                        .collect(),
                };
                (item, vec![unpack])
            }
        }
    }

    /// Body of a native loop with its `continue` prelude.
    pub(crate) fn loop_body(&mut self, body: StmtId, prelude: Vec<Stmt>) -> LowerResult<Block> {
        let (block, _) = self.with_frame(Frame::native_loop(), |this| {
            let mut stmts = prelude;
            stmts.extend(this.lower_block(body)?.stmts);
            Ok(stmts)
        })?;
        Ok(Block::new(block))
    }
}
