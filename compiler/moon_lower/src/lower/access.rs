//! Names, member and element access, method groups and `?.` chains.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::ExprKind;
use moon_ir::luau::{BinOp, Block, Expr, Function, Stmt, UnOp};
use moon_ir::sema::{Symbol, SymbolKind, TypeKind, WellKnownMember, WellKnownType};
use moon_ir::{ExprId, Name, SymbolId};

use super::{lua_index, Lowered, Lowerer};

/// `e + 1`, folded for literals.
pub(crate) fn plus_one(index: Expr) -> Expr {
    match index {
        Expr::Number(n) => Expr::Number(n + 1.0),
        other => Expr::binary(BinOp::Add, other, Expr::int(1)),
    }
}

impl Lowerer<'_> {
    /// `get_X` / `set_X`
    pub(crate) fn accessor(&self, prefix: &str, name: Name) -> Name {
        self.interner
            .intern_owned(format!("{prefix}{}", self.text(name)))
    }

    /// Table of the type declaring `symbol`, or `self` for instance members.
    pub(crate) fn implicit_receiver(&self, symbol: &Symbol) -> Expr {
        match symbol.owner {
            Some(owner) if symbol.is_static_member() => self.type_expr(owner),
            _ => self.self_expr(),
        }
    }

    /// Lower the receiver of a member access; type names become their table.
    pub(crate) fn lower_receiver(&mut self, receiver: ExprId, pre: &mut Vec<Stmt>) -> LowerResult<Expr> {
        match &self.arena.expr(receiver).kind {
            ExprKind::TypeRef(symbol) => Ok(self.type_expr(*symbol)),
            ExprKind::This | ExprKind::Base => Ok(self.self_expr()),
            _ => self.expr_into(receiver, pre),
        }
    }

    /// `recv:get_X()` / `Type.get_X()`
    pub(crate) fn property_get(&self, receiver: Expr, symbol: &Symbol) -> Expr {
        let getter = self.accessor("get_", symbol.name);
        if symbol.is_static_member() {
            receiver.member(getter).call(Vec::new())
        } else {
            receiver.method_call(getter, Vec::new())
        }
    }

    /// `recv:set_X(value)` / `Type.set_X(value)`
    pub(crate) fn property_set(&self, receiver: Expr, symbol: &Symbol, value: Expr) -> Expr {
        let setter = self.accessor("set_", symbol.name);
        if symbol.is_static_member() {
            receiver.member(setter).call(vec![value])
        } else {
            receiver.method_call(setter, vec![value])
        }
    }

    /// Whether `symbol` is a property with `get_`/`set_` accessors.
    pub(crate) fn is_computed_property(symbol: &Symbol) -> bool {
        matches!(
            symbol.kind,
            SymbolKind::Property {
                is_auto: false,
                well_known: None,
                ..
            }
        )
    }

    pub(crate) fn lower_ident(&mut self, name: Name, symbol: SymbolId) -> LowerResult<Lowered> {
        let Some(sym) = self.sema.symbol(symbol) else {
            return Ok(Lowered::pure(Expr::Ident(name)));
        };
        let value = match &sym.kind {
            SymbolKind::Local | SymbolKind::Parameter => Expr::Ident(name),
            SymbolKind::Type(_) => self.type_expr(symbol),
            SymbolKind::Method(_) => {
                let mut pre = Vec::new();
                let receiver = self.implicit_receiver(sym);
                let value = self.method_group(receiver, sym, &mut pre);
                return Ok(Lowered::new(pre, value));
            }
            _ if Self::is_computed_property(sym) => {
                self.property_get(self.implicit_receiver(sym), sym)
            }
            _ => self.implicit_receiver(sym).member(name),
        };
        Ok(Lowered::pure(value))
    }

    pub(crate) fn lower_member(
        &mut self,
        receiver: ExprId,
        name: Name,
        symbol: SymbolId,
    ) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let receiver_ty = self.ty(receiver);

        if let TypeKind::Tuple(elements) =
            self.sema.type_kind(self.sema.types.non_nullable(receiver_ty))
        {
            let text = self.text(name);
            let position = elements
                .iter()
                .position(|e| e.name == Some(name))
                .or_else(|| {
                    text.strip_prefix("Item")
                        .and_then(|n| n.parse::<usize>().ok())
                        .and_then(|n| n.checked_sub(1))
                });
            let Some(position) = position else {
                return Err(LowerError::invalid_tree(
                    "unknown tuple element",
                    self.span(receiver),
                ));
            };
            let tuple = self.expr_into(receiver, &mut pre)?;
            return Ok(Lowered::new(pre, tuple.index(lua_index(position))));
        }

        let Some(sym) = self.sema.symbol(symbol) else {
            let object = self.lower_receiver(receiver, &mut pre)?;
            return Ok(Lowered::new(pre, object.member(name)));
        };

        let value = match &sym.kind {
            SymbolKind::Property {
                well_known:
                    Some(WellKnownMember::CollectionCount | WellKnownMember::StringLength),
                ..
            } => {
                let object = self.lower_receiver(receiver, &mut pre)?;
                Expr::unary(UnOp::Len, object)
            }
            SymbolKind::EnumMember { .. } | SymbolKind::Type(_) => {
                self.implicit_receiver(sym).member(name)
            }
            SymbolKind::Method(_) => {
                if let ExprKind::Base = self.arena.expr(receiver).kind {
                    return Err(LowerError::unsupported(
                        "base method group",
                        self.span(receiver),
                    ));
                }
                let object = self.lower_receiver(receiver, &mut pre)?;
                self.method_group(object, sym, &mut pre)
            }
            _ if Self::is_computed_property(sym) => {
                let object = self.lower_receiver(receiver, &mut pre)?;
                self.property_get(object, sym)
            }
            _ => {
                let object = self.lower_receiver(receiver, &mut pre)?;
                object.member(name)
            }
        };
        Ok(Lowered::new(pre, value))
    }

    /// A method used as a value. The receiver is captured now, not when the
    /// delegate runs.
    fn method_group(&mut self, receiver: Expr, symbol: &Symbol, pre: &mut Vec<Stmt>) -> Expr {
        if symbol.is_static_member() {
            return receiver.member(symbol.name);
        }
        // A local may be reassigned before the delegate runs; `self` cannot.
        let receiver = if receiver == self.self_expr() {
            receiver
        } else {
            let temp = self.fresh("recv");
            pre.push(Stmt::local(temp, receiver));
            Expr::Ident(temp)
        };
        let call = receiver.method_call(symbol.name, vec![Expr::Vararg]);
        Expr::function(Function {
            variadic: Some(None),
            body: Block::new(vec![Stmt::ret(call)]),
            ..Function::default()
        })
    }

    pub(crate) fn lower_element(&mut self, receiver: ExprId, index: ExprId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let parts = vec![self.lower_expr(receiver)?, self.lower_expr(index)?];
        let mut values = self.sequence(parts, &mut pre).into_iter();
        let (Some(object), Some(key)) = (values.next(), values.next()) else {
            return Err(LowerError::invalid_tree("element access", self.span(receiver)));
        };

        let receiver_ty = self.ty(receiver);
        let value = if self.sema.types.is_string(receiver_ty) {
            let key = self.spill(key, "index", &mut pre);
            self.lib_call(
                self.names.string,
                self.names.sub,
                vec![object, plus_one(key.clone()), plus_one(key)],
            )
        } else if matches!(
            self.sema.well_known(receiver_ty),
            Some(WellKnownType::Dictionary | WellKnownType::IDictionary)
        ) {
            object.index(key)
        } else {
            object.index(plus_one(key))
        };
        Ok(Lowered::new(pre, value))
    }

    /// `receiver?.access`
    ///
    /// ```text
    /// local _t = receiver
    /// if _t ~= nil then
    ///   _t = _t.access
    /// end
    /// ```
    pub(crate) fn lower_conditional_access(
        &mut self,
        receiver: ExprId,
        access: ExprId,
    ) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let value = self.expr_into(receiver, &mut pre)?;
        let temp = self.fresh("t");
        pre.push(Stmt::local(temp, value));

        self.conditional_receivers.push(Expr::Ident(temp));
        let inner = self.lower_expr(access);
        self.conditional_receivers.pop();
        let Lowered { prereqs, value } = inner?;

        let mut then = prereqs;
        then.push(Stmt::assign(Expr::Ident(temp), value));
        pre.push(Stmt::if_then(
            Expr::binary(BinOp::NotEq, Expr::Ident(temp), Expr::Nil),
            Block::new(then),
        ));
        Ok(Lowered::new(pre, Expr::Ident(temp)))
    }

    /// `receiver?.M()` whose value is discarded.
    pub(crate) fn lower_conditional_access_stmt(
        &mut self,
        receiver: ExprId,
        access: ExprId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let value = self.expr_into(receiver, out)?;
        let temp = self.fresh("t");
        out.push(Stmt::local(temp, value));

        self.conditional_receivers.push(Expr::Ident(temp));
        let mut then = Vec::new();
        let inner = self.lower_expr_stmt(access, &mut then);
        self.conditional_receivers.pop();
        inner?;

        out.push(Stmt::if_then(
            Expr::binary(BinOp::NotEq, Expr::Ident(temp), Expr::Nil),
            Block::new(then),
        ));
        Ok(())
    }

    pub(crate) fn conditional_receiver(&self, id: ExprId) -> LowerResult<Lowered> {
        match self.conditional_receivers.last() {
            Some(value) => Ok(Lowered::pure(value.clone())),
            None => Err(LowerError::invalid_tree(
                "conditional receiver outside of a `?.` chain",
                self.span(id),
            )),
        }
    }
}
