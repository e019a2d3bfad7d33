//! Library members with dedicated lowerings.
//!
//! Collections are plain tables: lists are 1-based arrays, dictionaries are
//! keyed tables and sets map each element to `true`.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::ExprKind;
use moon_ir::luau::{BinOp, Block, Expr, Stmt, UnOp};
use moon_ir::sema::WellKnownMember;
use moon_ir::{ExprId, Span};

use super::access::plus_one;
use super::{IterShape, Lowered, Lowerer};

impl Lowerer<'_> {
    /// Receiver of an instance or extension call; `None` for static calls.
    fn builtin_receiver(&mut self, callee: ExprId) -> LowerResult<Option<Lowered>> {
        match &self.arena.expr(callee).kind {
            ExprKind::Member { receiver, .. }
                if !matches!(self.arena.expr(*receiver).kind, ExprKind::TypeRef(_)) =>
            {
                Ok(Some(self.lower_receiver_lowered(*receiver)?))
            }
            _ => Ok(None),
        }
    }

    /// Receiver and arguments for a library call. Extension calls written
    /// in static form (`Enumerable.ToList(xs)`) take their receiver from the
    /// first argument.
    fn builtin_operands(
        &mut self,
        callee: ExprId,
        args: &[ExprId],
        pre: &mut Vec<Stmt>,
    ) -> LowerResult<(Option<Expr>, Vec<Expr>)> {
        let receiver = self.builtin_receiver(callee)?;
        self.lower_args(receiver, args, pre)
    }

    pub(crate) fn lower_builtin_call(
        &mut self,
        member: WellKnownMember,
        id: ExprId,
        callee: ExprId,
        args: &[ExprId],
    ) -> LowerResult<Option<Lowered>> {
        let span = self.span(id);
        match (member, args) {
            (WellKnownMember::Invoke, _) => return Ok(None),
            (WellKnownMember::EnumerableRange, [start, count]) => {
                let shape = IterShape::EnumerableRange {
                    start: *start,
                    count: *count,
                };
                return self.materialize_range(shape, span).map(Some);
            }
            (WellKnownMember::EnumerableRange, _) => {
                return Err(LowerError::invalid_tree("Enumerable.Range arity", span))
            }
            _ => {}
        }

        let mut pre = Vec::new();
        let (receiver, mut values) = self.builtin_operands(callee, args, &mut pre)?;
        let names = self.names;

        // The instance (or first argument of a static-form call).
        let mut subject = match receiver {
            Some(receiver) => Some(receiver),
            None if matches!(
                member,
                WellKnownMember::EnumerableCollect
                    | WellKnownMember::ToString
                    | WellKnownMember::CollectionCount
            ) && !values.is_empty() =>
            {
                Some(values.remove(0))
            }
            None => None,
        };
        let mut take_subject = || {
            subject
                .take()
                .ok_or_else(|| LowerError::invalid_tree("library call without a receiver", span))
        };

        let value = match member {
            WellKnownMember::ConsoleWriteLine => self.global_call(names.print, values),
            WellKnownMember::MathAbs => self.lib_call(names.math, names.abs, values),
            WellKnownMember::MathFloor => self.lib_call(names.math, names.floor, values),
            WellKnownMember::MathCeiling => self.lib_call(names.math, names.ceil, values),
            WellKnownMember::MathMax => self.lib_call(names.math, names.max, values),
            WellKnownMember::MathMin => self.lib_call(names.math, names.min, values),
            WellKnownMember::MathSqrt => self.lib_call(names.math, names.sqrt, values),
            WellKnownMember::MathPow => match <[Expr; 2]>::try_from(values) {
                Ok([base, exponent]) => Expr::binary(BinOp::Pow, base, exponent),
                Err(_) => return Err(LowerError::invalid_tree("Math.Pow arity", span)),
            },

            WellKnownMember::ListAdd => {
                let list = take_subject()?;
                values.insert(0, list);
                self.lib_call(names.table, names.insert, values)
            }
            WellKnownMember::ListInsert => {
                let list = take_subject()?;
                let mut values = values.into_iter();
                let (Some(index), Some(item)) = (values.next(), values.next()) else {
                    return Err(LowerError::invalid_tree("List.Insert arity", span));
                };
                self.lib_call(names.table, names.insert, vec![list, plus_one(index), item])
            }
            WellKnownMember::ListRemoveAt => {
                let list = take_subject()?;
                let Some(index) = values.into_iter().next() else {
                    return Err(LowerError::invalid_tree("List.RemoveAt arity", span));
                };
                self.lib_call(names.table, names.remove, vec![list, plus_one(index)])
            }
            WellKnownMember::ListClear => {
                let list = take_subject()?;
                self.lib_call(names.table, names.clear, vec![list])
            }
            WellKnownMember::ListContains => {
                values.insert(0, take_subject()?);
                Expr::binary(
                    BinOp::NotEq,
                    self.lib_call(names.table, names.find, values),
                    Expr::Nil,
                )
            }
            WellKnownMember::CollectionCount | WellKnownMember::StringLength => {
                Expr::unary(UnOp::Len, take_subject()?)
            }

            WellKnownMember::DictionaryContainsKey => {
                let key = first(values, span)?;
                Expr::binary(BinOp::NotEq, take_subject()?.index(key), Expr::Nil)
            }
            WellKnownMember::SetContains => {
                let item = first(values, span)?;
                Expr::binary(BinOp::Eq, take_subject()?.index(item), Expr::Bool(true))
            }
            WellKnownMember::DictionaryRemove | WellKnownMember::SetRemove => {
                let table = take_subject()?;
                let table = self.spill(table, "table", &mut pre);
                let key = first(values, span)?;
                let key = self.spill(key, "key", &mut pre);
                let slot = table.index(key);
                let removed = self.fresh("removed");
                pre.push(Stmt::local(
                    removed,
                    Expr::binary(BinOp::NotEq, slot.clone(), Expr::Nil),
                ));
                pre.push(Stmt::assign(slot, Expr::Nil));
                Expr::Ident(removed)
            }
            WellKnownMember::SetAdd => {
                let set = take_subject()?;
                let set = self.spill(set, "set", &mut pre);
                let item = first(values, span)?;
                let item = self.spill(item, "item", &mut pre);
                let slot = set.index(item);
                let added = self.fresh("added");
                pre.push(Stmt::local(
                    added,
                    Expr::binary(BinOp::Eq, slot.clone(), Expr::Nil),
                ));
                pre.push(Stmt::assign(slot, Expr::Bool(true)));
                Expr::Ident(added)
            }

            WellKnownMember::StringToUpper => take_subject()?.method_call(names.upper, values),
            WellKnownMember::StringToLower => take_subject()?.method_call(names.lower, values),
            WellKnownMember::StringSubstring => {
                let text = take_subject()?;
                let mut values = values.into_iter();
                let Some(start) = values.next() else {
                    return Err(LowerError::invalid_tree("Substring arity", span));
                };
                match values.next() {
                    None => text.method_call(names.sub, vec![plus_one(start)]),
                    Some(length) => {
                        let start = self.spill(start, "start", &mut pre);
                        let end = match (&start, &length) {
                            (Expr::Number(s), Expr::Number(l)) => Expr::Number(s + l),
                            _ => Expr::binary(BinOp::Add, start.clone(), length),
                        };
                        text.method_call(names.sub, vec![plus_one(start), end])
                    }
                }
            }
            WellKnownMember::StringTrim => take_subject()?
                .method_call(names.match_, vec![Expr::string("^%s*(.-)%s*$")]),
            WellKnownMember::StringFormat => self.cs_call(names.format, values),
            WellKnownMember::StringIsNullOrEmpty => {
                let text = first(values, span)?;
                let text = self.spill(text, "text", &mut pre);
                Expr::binary(
                    BinOp::Or,
                    Expr::binary(BinOp::Eq, text.clone(), Expr::Nil),
                    Expr::binary(BinOp::Eq, text, Expr::string("")),
                )
            }
            WellKnownMember::ToString => self.global_call(names.tostring, vec![take_subject()?]),
            WellKnownMember::Dispose => take_subject()?.method_call(names.dispose, Vec::new()),

            WellKnownMember::EnumerableCollect => {
                let source = take_subject()?;
                let source_id = self.collect_source(callee, args);
                self.collect(source, source_id, &mut pre)
            }
            WellKnownMember::Invoke | WellKnownMember::EnumerableRange => return Ok(None),
        };
        Ok(Some(Lowered::new(pre, value)))
    }

    /// Statement forms that need no result temporary. Returns whether the
    /// call was handled.
    pub(crate) fn lower_builtin_stmt(
        &mut self,
        member: WellKnownMember,
        callee: ExprId,
        args: &[ExprId],
        out: &mut Vec<Stmt>,
    ) -> LowerResult<bool> {
        let value = match member {
            WellKnownMember::SetAdd => Expr::Bool(true),
            WellKnownMember::SetRemove | WellKnownMember::DictionaryRemove => Expr::Nil,
            _ => return Ok(false),
        };
        let Some(receiver) = self.builtin_receiver(callee)? else {
            return Ok(false);
        };
        let (table, mut keys) = self.lower_args(Some(receiver), args, out)?;
        let (Some(table), Some(key)) = (table, keys.pop()) else {
            return Ok(false);
        };
        out.push(Stmt::assign(table.index(key), value));
        Ok(true)
    }

    /// The source expression of `ToList()`/`ToArray()`, for its shape.
    fn collect_source(&self, callee: ExprId, args: &[ExprId]) -> Option<ExprId> {
        match &self.arena.expr(callee).kind {
            ExprKind::Member { receiver, .. }
                if !matches!(self.arena.expr(*receiver).kind, ExprKind::TypeRef(_)) =>
            {
                Some(*receiver)
            }
            _ => args.first().copied(),
        }
    }

    /// Copy an enumerable into a fresh list.
    fn collect(&mut self, source: Expr, source_id: Option<ExprId>, pre: &mut Vec<Stmt>) -> Expr {
        let shape = source_id.map_or(IterShape::Opaque, |id| self.iter_shape(id));
        match shape {
            IterShape::Array => self.lib_call(self.names.table, self.names.clone, vec![source]),
            IterShape::Opaque if self.options.macros.enable_iterator_helpers => {
                self.cs_call(self.names.collect, vec![source])
            }
            _ => {
                let list = self.fresh("list");
                pre.push(Stmt::local(list, Expr::Table(Vec::new())));
                let (vars, iter, item) = match shape {
                    IterShape::Dictionary => {
                        let key = self.fresh("key");
                        let value = self.fresh("value");
                        let pair = self.key_value_pair(Expr::Ident(key), Expr::Ident(value));
                        (
                            vec![key, value],
                            self.global_call(self.names.pairs, vec![source]),
                            pair,
                        )
                    }
                    IterShape::Set => {
                        let item = self.fresh("item");
                        (
                            vec![item],
                            self.global_call(self.names.pairs, vec![source]),
                            Expr::Ident(item),
                        )
                    }
                    IterShape::String => {
                        let item = self.fresh("item");
                        let chars = self.lib_call(
                            self.names.string,
                            self.names.gmatch,
                            vec![source, Expr::string(".")],
                        );
                        (vec![item], chars, Expr::Ident(item))
                    }
                    _ => {
                        let index = self.fresh("index");
                        let item = self.fresh("item");
                        (vec![index, item], source, Expr::Ident(item))
                    }
                };
                let insert =
                    self.lib_call(self.names.table, self.names.insert, vec![Expr::Ident(list), item]);
                pre.push(Stmt::GenericFor {
                    vars,
                    iter: vec![iter],
                    body: Block::new(vec![Stmt::Expr(insert)]),
                });
                Expr::Ident(list)
            }
        }
    }

    /// A numeric range used as a value: a list of its elements.
    pub(crate) fn materialize_range(&mut self, shape: IterShape, span: Span) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let Some(bounds) = self.numeric_bounds(shape, &mut pre)? else {
            return Err(LowerError::invalid_tree("range without bounds", span));
        };
        let list = self.fresh("range");
        let var = self.fresh("i");
        pre.push(Stmt::local(list, Expr::Table(Vec::new())));
        let insert = self.lib_call(
            self.names.table,
            self.names.insert,
            vec![Expr::Ident(list), Expr::Ident(var)],
        );
        let unit_step = matches!(bounds.step, Expr::Number(n) if (n - 1.0).abs() < f64::EPSILON);
        pre.push(Stmt::NumericFor {
            var,
            start: bounds.start,
            end: bounds.last,
            step: (!unit_step).then_some(bounds.step),
            body: Block::new(vec![Stmt::Expr(insert)]),
        });
        Ok(Lowered::new(pre, Expr::Ident(list)))
    }
}

fn first(values: Vec<Expr>, span: Span) -> LowerResult<Expr> {
    values
        .into_iter()
        .next()
        .ok_or_else(|| LowerError::invalid_tree("missing argument", span))
}
