//! Assignment, compound assignment and increment/decrement.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{BinaryOp, ExprKind, IncDecOp};
use moon_ir::luau::{BinOp, Block, CompoundOp, Expr, Stmt};
use moon_ir::sema::{Symbol, SymbolKind, WellKnownType};
use moon_ir::{ExprId, TypeId};

use super::access::plus_one;
use super::{lua_index, Lowered, Lowerer};

/// An assignable location with its receiver already evaluated.
enum Place<'s> {
    /// Local, field, auto-property or table slot.
    Slot(Expr),
    /// Property with accessors.
    Property { receiver: Expr, symbol: &'s Symbol },
    /// Event: `+=`/`-=` subscribe and unsubscribe.
    Event(Expr),
}

impl<'a> Lowerer<'a> {
    /// Evaluate the receiver and index of an assignment target.
    fn lower_place(&mut self, target: ExprId, pre: &mut Vec<Stmt>) -> LowerResult<Place<'a>> {
        let sema = self.sema;
        let expr = self.arena.expr(target);
        match &expr.kind {
            ExprKind::Ident { name, symbol } => {
                let Some(sym) = sema.symbol(*symbol) else {
                    return Ok(Place::Slot(Expr::Ident(*name)));
                };
                match &sym.kind {
                    SymbolKind::Local | SymbolKind::Parameter => Ok(Place::Slot(Expr::Ident(*name))),
                    SymbolKind::Event { .. } => {
                        Ok(Place::Event(self.implicit_receiver(sym).member(*name)))
                    }
                    _ if Self::is_computed_property(sym) => Ok(Place::Property {
                        receiver: self.implicit_receiver(sym),
                        symbol: sym,
                    }),
                    _ => Ok(Place::Slot(self.implicit_receiver(sym).member(*name))),
                }
            }
            ExprKind::Member {
                receiver,
                name,
                symbol,
            } => {
                let object = self.lower_receiver(*receiver, pre)?;
                let object = self.spill(object, "object", pre);
                match sema.symbol(*symbol) {
                    Some(sym) if matches!(sym.kind, SymbolKind::Event { .. }) => {
                        Ok(Place::Event(object.member(*name)))
                    }
                    Some(sym) if Self::is_computed_property(sym) => Ok(Place::Property {
                        receiver: object,
                        symbol: sym,
                    }),
                    _ => Ok(Place::Slot(object.member(*name))),
                }
            }
            ExprKind::Element { receiver, index } => {
                let receiver_ty = self.ty(*receiver);
                let parts = vec![self.lower_expr(*receiver)?, self.lower_expr(*index)?];
                let mut values = self.sequence(parts, pre).into_iter();
                let (Some(object), Some(key)) = (values.next(), values.next()) else {
                    return Err(LowerError::invalid_tree("element target", expr.span));
                };
                let object = self.spill(object, "object", pre);
                let key = self.spill(key, "key", pre);
                let key = if matches!(
                    sema.well_known(receiver_ty),
                    Some(WellKnownType::Dictionary | WellKnownType::IDictionary)
                ) {
                    key
                } else {
                    plus_one(key)
                };
                Ok(Place::Slot(object.index(key)))
            }
            ExprKind::ConditionalReceiver => Ok(Place::Slot(self.conditional_receiver(target)?.value)),
            _ => Err(LowerError::invalid_tree("assignment to a non-assignable expression", expr.span)),
        }
    }

    fn read_place(&self, place: &Place<'_>) -> Expr {
        match place {
            Place::Slot(e) | Place::Event(e) => e.clone(),
            Place::Property { receiver, symbol } => self.property_get(receiver.clone(), symbol),
        }
    }

    fn write_place(&self, place: &Place<'_>, value: Expr) -> Stmt {
        match place {
            Place::Slot(e) | Place::Event(e) => Stmt::assign(e.clone(), value),
            Place::Property { receiver, symbol } => {
                Stmt::Expr(self.property_set(receiver.clone(), symbol, value))
            }
        }
    }

    pub(crate) fn lower_assign_stmt(
        &mut self,
        target: ExprId,
        value: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        if let ExprKind::Tuple(targets) = self.arena.expr(target).kind {
            return self.lower_tuple_assign(self.arena.expr_list(targets), value, out);
        }
        let place = self.lower_place(target, out)?;
        let value = self.expr_into(value, out)?;
        out.push(self.write_place(&place, value));
        Ok(())
    }

    /// `(a, b) = value`
    fn lower_tuple_assign(
        &mut self,
        targets: &[ExprId],
        value: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let mut places = Vec::with_capacity(targets.len());
        for &target in targets {
            match self.lower_place(target, out)? {
                Place::Slot(slot) => places.push(slot),
                _ => {
                    return Err(LowerError::unsupported(
                        "tuple assignment to a property or event",
                        self.span(target),
                    ))
                }
            }
        }
        let values = match self.arena.expr(value).kind {
            ExprKind::Tuple(items) => self.ordered(self.arena.expr_list(items), out)?,
            _ => {
                let tuple = self.expr_into(value, out)?;
                let tuple = self.spill(tuple, "tuple", out);
                (0..places.len()).map(|i| tuple.clone().index(lua_index(i))).collect()
            }
        };
        out.push(Stmt::Assign {
            targets: places,
            values,
        });
        Ok(())
    }

    /// `target = value` used as a value.
    pub(crate) fn lower_assign_value(&mut self, target: ExprId, value: ExprId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        if let ExprKind::Tuple(_) = self.arena.expr(target).kind {
            self.lower_assign_stmt(target, value, &mut pre)?;
            let value = self.expr_into(target, &mut pre)?;
            return Ok(Lowered::new(pre, value));
        }
        let place = self.lower_place(target, &mut pre)?;
        let value = self.expr_into(value, &mut pre)?;
        let result = match &place {
            Place::Slot(Expr::Ident(name)) => {
                pre.push(Stmt::assign(Expr::Ident(*name), value));
                Expr::Ident(*name)
            }
            _ => {
                let value = self.spill(value, "value", &mut pre);
                pre.push(self.write_place(&place, value.clone()));
                value
            }
        };
        Ok(Lowered::new(pre, result))
    }

    /// Native compound operator for `target op= value`, if Luau has one with
    /// the same semantics. Integer division and every remainder go through
    /// [`Lowerer::binary_value`].
    fn native_compound(&self, op: BinaryOp, target_ty: TypeId) -> Option<CompoundOp> {
        let types = &self.sema.types;
        match op {
            BinaryOp::Add if types.is_string(target_ty) => Some(CompoundOp::Concat),
            BinaryOp::Add => Some(CompoundOp::Add),
            BinaryOp::Sub => Some(CompoundOp::Sub),
            BinaryOp::Mul => Some(CompoundOp::Mul),
            BinaryOp::Div if !types.is_integral(target_ty) => Some(CompoundOp::Div),
            _ => None,
        }
    }

    pub(crate) fn lower_compound_stmt(
        &mut self,
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let place = self.lower_place(target, out)?;
        self.emit_compound(op, &place, target, value, out)
    }

    fn emit_compound(
        &mut self,
        op: BinaryOp,
        place: &Place<'a>,
        target: ExprId,
        value: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let target_ty = self.ty(target);
        let value_ty = self.ty(value);

        if op == BinaryOp::Coalesce {
            let current = self.read_place(place);
            let Lowered { prereqs, value } = self.lower_expr(value)?;
            let mut then = prereqs;
            then.push(self.write_place(place, value));
            out.push(Stmt::if_then(
                Expr::binary(BinOp::Eq, current, Expr::Nil),
                Block::new(then),
            ));
            return Ok(());
        }

        let rhs = self.expr_into(value, out)?;
        match place {
            Place::Event(event) => {
                let method = match op {
                    BinaryOp::Add => self.names.connect,
                    BinaryOp::Sub => self.names.disconnect,
                    _ => {
                        return Err(LowerError::unsupported(
                            "event operator other than += and -=",
                            self.span(target),
                        ))
                    }
                };
                out.push(Stmt::Expr(event.clone().method_call(method, vec![rhs])));
            }
            Place::Slot(slot) => match self.native_compound(op, target_ty) {
                Some(CompoundOp::Concat) => out.push(Stmt::CompoundAssign {
                    op: CompoundOp::Concat,
                    target: slot.clone(),
                    value: self.concat_operand(rhs, value_ty),
                }),
                Some(native) => out.push(Stmt::CompoundAssign {
                    op: native,
                    target: slot.clone(),
                    value: rhs,
                }),
                None => {
                    let combined =
                        self.binary_value(op, slot.clone(), rhs, target_ty, value_ty, target_ty);
                    out.push(Stmt::assign(slot.clone(), combined));
                }
            },
            Place::Property { .. } => {
                let current = self.read_place(place);
                let combined = self.binary_value(op, current, rhs, target_ty, value_ty, target_ty);
                out.push(self.write_place(place, combined));
            }
        }
        Ok(())
    }

    /// `target op= value` used as a value: the updated target.
    pub(crate) fn lower_compound_value(
        &mut self,
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
    ) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let target_ty = self.ty(target);
        let value_ty = self.ty(value);
        let place = self.lower_place(target, &mut pre)?;
        if let Place::Property { .. } = place {
            let current = self.read_place(&place);
            let rhs = self.expr_into(value, &mut pre)?;
            let combined = self.binary_value(op, current, rhs, target_ty, value_ty, target_ty);
            let result = self.fresh("value");
            pre.push(Stmt::local(result, combined));
            pre.push(self.write_place(&place, Expr::Ident(result)));
            return Ok(Lowered::new(pre, Expr::Ident(result)));
        }
        // Receiver and index are already spilled, so the slot reads back
        // the updated value.
        self.emit_compound(op, &place, target, value, &mut pre)?;
        Ok(Lowered::new(pre, self.read_place(&place)))
    }

    fn step(&self, op: IncDecOp) -> (BinaryOp, CompoundOp) {
        if op.is_increment() {
            (BinaryOp::Add, CompoundOp::Add)
        } else {
            (BinaryOp::Sub, CompoundOp::Sub)
        }
    }

    pub(crate) fn lower_incdec_stmt(
        &mut self,
        op: IncDecOp,
        target: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let target_ty = self.ty(target);
        let place = self.lower_place(target, out)?;
        let (binary, compound) = self.step(op);
        match &place {
            Place::Slot(slot) | Place::Event(slot) => out.push(Stmt::CompoundAssign {
                op: compound,
                target: slot.clone(),
                value: Expr::int(1),
            }),
            Place::Property { .. } => {
                let current = self.read_place(&place);
                let next =
                    self.binary_value(binary, current, Expr::int(1), target_ty, TypeId::INT, target_ty);
                out.push(self.write_place(&place, next));
            }
        }
        Ok(())
    }

    /// `x++` / `++x` used as a value.
    pub(crate) fn lower_incdec_value(&mut self, op: IncDecOp, target: ExprId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let target_ty = self.ty(target);
        let place = self.lower_place(target, &mut pre)?;
        let (binary, _) = self.step(op);
        let current = self.read_place(&place);

        if op.is_prefix() {
            let next =
                self.binary_value(binary, current, Expr::int(1), target_ty, TypeId::INT, target_ty);
            let result = self.fresh("value");
            pre.push(Stmt::local(result, next));
            pre.push(self.write_place(&place, Expr::Ident(result)));
            return Ok(Lowered::new(pre, Expr::Ident(result)));
        }

        let old = self.fresh("old");
        pre.push(Stmt::local(old, current));
        let next = self.binary_value(
            binary,
            Expr::Ident(old),
            Expr::int(1),
            target_ty,
            TypeId::INT,
            target_ty,
        );
        pre.push(self.write_place(&place, next));
        Ok(Lowered::new(pre, Expr::Ident(old)))
    }
}
