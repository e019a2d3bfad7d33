//! Expression dispatch, operators, literals and object creation.

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{
    BinaryOp, ExprKind, Initializer, InterpolationPart, LambdaBody, LambdaParam, MethodBody, Param,
    UnaryOp,
};
use moon_ir::luau::{BinOp, Block, Expr, InterpPart, Stmt, TableField, TypeInfo, UnOp};
use moon_ir::sema::{TypeDeclKind, TypeKind, WellKnownType};
use moon_ir::{ExprId, ExprRange, Name, SymbolId, TypeId};

use super::{Callable, IterShape, Lowered, Lowerer};
use crate::control_flow::generators::contains_yield;

impl Lowerer<'_> {
    pub(crate) fn lower_expr_kind(&mut self, id: ExprId) -> LowerResult<Lowered> {
        let expr = self.arena.expr(id);
        let pure = |value: Expr| -> LowerResult<Lowered> { Ok(Lowered::pure(value)) };
        match &expr.kind {
            ExprKind::Null => pure(Expr::Nil),
            ExprKind::Bool(b) => pure(Expr::Bool(*b)),
            ExprKind::Int(n) => pure(Expr::int(*n)),
            ExprKind::Float(f) => pure(Expr::Number(*f)),
            ExprKind::Char(c) => pure(Expr::String(c.to_string())),
            ExprKind::String(text) => pure(Expr::string(self.text(*text))),
            ExprKind::NameOf(text) => pure(Expr::string(self.text(*text))),
            ExprKind::Default => pure(self.default_value(expr.ty)),

            ExprKind::Ident { name, symbol } => self.lower_ident(*name, *symbol),
            ExprKind::This | ExprKind::Base => pure(self.self_expr()),
            ExprKind::TypeRef(symbol) => pure(self.type_expr(*symbol)),
            ExprKind::Member {
                receiver,
                name,
                symbol,
            } => self.lower_member(*receiver, *name, *symbol),
            ExprKind::Element { receiver, index } => self.lower_element(*receiver, *index),
            ExprKind::ConditionalAccess { receiver, access } => {
                self.lower_conditional_access(*receiver, *access)
            }
            ExprKind::ConditionalReceiver => self.conditional_receiver(id),

            ExprKind::Invocation {
                callee,
                args,
                method,
            } => self.lower_invocation(id, *callee, *args, *method),
            ExprKind::New {
                args,
                ctor,
                initializer,
            } => self.lower_new(id, *args, *ctor, initializer.as_ref()),
            ExprKind::ArrayCreation { size } => self.lower_array_creation(expr.ty, *size),
            ExprKind::Collection(items) => self.lower_collection(expr.ty, *items),
            ExprKind::Tuple(items) => {
                let mut pre = Vec::new();
                let values = self.ordered(self.arena.expr_list(*items), &mut pre)?;
                Ok(Lowered::new(
                    pre,
                    Expr::Table(values.into_iter().map(TableField::Positional).collect()),
                ))
            }

            ExprKind::Binary { op, left, right } => self.lower_binary(*op, *left, *right, expr.ty),
            ExprKind::Unary { op, operand } => self.lower_unary(*op, *operand),
            ExprKind::IncDec { op, target } => self.lower_incdec_value(*op, *target),
            ExprKind::Assign { target, value } => self.lower_assign_value(*target, *value),
            ExprKind::CompoundAssign { op, target, value } => {
                self.lower_compound_value(*op, *target, *value)
            }
            ExprKind::Conditional {
                cond,
                then_value,
                else_value,
            } => self.lower_conditional(*cond, *then_value, *else_value),

            ExprKind::Lambda {
                params,
                body,
                is_async,
            } => self.lower_lambda(expr.ty, params, *body, *is_async),
            ExprKind::Interpolated(parts) => self.lower_interpolated(parts),
            ExprKind::Cast { expr: inner, target } => self.lower_cast(*inner, *target),
            ExprKind::As { expr: inner, target } => self.lower_as(*inner, *target),
            ExprKind::TypeOf(ty) => pure(self.type_value(*ty)),
            ExprKind::Is { expr: subject, pattern } => self.lower_is(*subject, *pattern),
            ExprKind::Switch { subject, arms } => self.lower_switch_expr(id, *subject, arms),
            ExprKind::Await(inner) => {
                let mut pre = Vec::new();
                let value = self.expr_into(*inner, &mut pre)?;
                Ok(Lowered::new(pre, self.cs_call(self.names.await_, vec![value])))
            }
            ExprKind::Range { start, end, step } => {
                let shape = IterShape::Range {
                    start: *start,
                    end: *end,
                    step: step.present(),
                };
                self.materialize_range(shape, expr.span)
            }
        }
    }

    /// Value of `default(T)`.
    pub(crate) fn default_value(&self, ty: TypeId) -> Expr {
        let types = &self.sema.types;
        if matches!(types.kind(ty), TypeKind::Nullable(_)) {
            return Expr::Nil;
        }
        if types.is_numeric(ty) && !types.is_string(ty) {
            return Expr::int(0);
        }
        if ty == TypeId::BOOL {
            return Expr::Bool(false);
        }
        match self.sema.type_symbol_of(ty) {
            Some((symbol, sym)) if sym.decl_kind == TypeDeclKind::Struct && sym.well_known.is_none() => {
                self.type_expr(symbol).member(self.names.new).call(Vec::new())
            }
            Some((_, sym)) if sym.decl_kind == TypeDeclKind::Enum => Expr::int(0),
            _ => Expr::Nil,
        }
    }

    /// A type as a runtime value (`typeof(T)`, `is`/`as` operands).
    pub(crate) fn type_value(&self, ty: TypeId) -> Expr {
        match self.sema.type_symbol_of(ty) {
            Some((symbol, sym)) if sym.well_known.is_none() => self.type_expr(symbol),
            _ => match self.types.map(ty) {
                TypeInfo::Basic(name) => Expr::string(self.text(name)),
                _ => Expr::string(self.text(self.interner.intern("table"))),
            },
        }
    }

    // Operators

    /// `..` operand: strings and numbers concatenate natively.
    pub(crate) fn concat_operand(&self, value: Expr, ty: TypeId) -> Expr {
        let types = &self.sema.types;
        if types.is_string(ty) || types.is_numeric(ty) || matches!(value, Expr::String(_)) {
            value
        } else {
            self.global_call(self.names.tostring, vec![value])
        }
    }

    /// A non-short-circuit binary operator on already-ordered operands.
    pub(crate) fn binary_value(
        &self,
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
        lhs_ty: TypeId,
        rhs_ty: TypeId,
        result_ty: TypeId,
    ) -> Expr {
        let types = &self.sema.types;
        let native = |op| Expr::binary(op, lhs.clone(), rhs.clone());
        let bit = |f: Name| self.lib_call(self.names.bit32, f, vec![lhs.clone(), rhs.clone()]);
        match op {
            BinaryOp::Add if types.is_string(lhs_ty) || types.is_string(rhs_ty) => Expr::binary(
                BinOp::Concat,
                self.concat_operand(lhs.clone(), lhs_ty),
                self.concat_operand(rhs.clone(), rhs_ty),
            ),
            BinaryOp::Add => native(BinOp::Add),
            BinaryOp::Sub => native(BinOp::Sub),
            BinaryOp::Mul => native(BinOp::Mul),
            BinaryOp::Div if types.is_integral(result_ty) => self.truncate(native(BinOp::Div)),
            BinaryOp::Div => native(BinOp::Div),
            // Luau's `%` floors; the remainder keeps the dividend's sign.
            BinaryOp::Mod => self.lib_call(
                self.names.math,
                self.names.fmod,
                vec![lhs.clone(), rhs.clone()],
            ),
            BinaryOp::Eq => native(BinOp::Eq),
            BinaryOp::NotEq => native(BinOp::NotEq),
            BinaryOp::Lt => native(BinOp::Lt),
            BinaryOp::LtEq => native(BinOp::LtEq),
            BinaryOp::Gt => native(BinOp::Gt),
            BinaryOp::GtEq => native(BinOp::GtEq),
            BinaryOp::And => native(BinOp::And),
            BinaryOp::Or => native(BinOp::Or),
            BinaryOp::BitAnd if result_ty == TypeId::BOOL => native(BinOp::And),
            BinaryOp::BitOr if result_ty == TypeId::BOOL => native(BinOp::Or),
            BinaryOp::BitXor if result_ty == TypeId::BOOL => native(BinOp::NotEq),
            BinaryOp::BitAnd => bit(self.names.band),
            BinaryOp::BitOr => bit(self.names.bor),
            BinaryOp::BitXor => bit(self.names.bxor),
            BinaryOp::Shl => bit(self.names.lshift),
            BinaryOp::Shr => bit(self.names.arshift),
            BinaryOp::Coalesce => Expr::if_else(
                Expr::binary(BinOp::NotEq, lhs.clone(), Expr::Nil),
                lhs.clone(),
                rhs.clone(),
            ),
        }
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        ty: TypeId,
    ) -> LowerResult<Lowered> {
        let lhs_ty = self.ty(left);
        let rhs_ty = self.ty(right);
        let lhs = self.lower_expr(left)?;
        let rhs = self.lower_expr(right)?;

        if op.is_short_circuit() {
            let mut pre = lhs.prereqs;
            if !rhs.has_prereqs() {
                let value = match op {
                    BinaryOp::And => Expr::binary(BinOp::And, lhs.value, rhs.value),
                    BinaryOp::Or => Expr::binary(BinOp::Or, lhs.value, rhs.value),
                    _ => {
                        let left = self.spill(lhs.value, "left", &mut pre);
                        self.binary_value(op, left, rhs.value, lhs_ty, rhs_ty, ty)
                    }
                };
                return Ok(Lowered::new(pre, value));
            }

            // The right side's prerequisites may only run when it is evaluated.
            let temp = self.fresh("value");
            pre.push(Stmt::local(temp, lhs.value));
            let guard = match op {
                BinaryOp::And => Expr::Ident(temp),
                BinaryOp::Or => Expr::Ident(temp).not(),
                _ => Expr::binary(BinOp::Eq, Expr::Ident(temp), Expr::Nil),
            };
            let mut then = rhs.prereqs;
            then.push(Stmt::assign(Expr::Ident(temp), rhs.value));
            pre.push(Stmt::if_then(guard, Block::new(then)));
            return Ok(Lowered::new(pre, Expr::Ident(temp)));
        }

        let mut pre = Vec::new();
        let mut values = self.sequence(vec![lhs, rhs], &mut pre).into_iter();
        let (Some(lhs), Some(rhs)) = (values.next(), values.next()) else {
            return Err(LowerError::invalid_tree("binary operands", self.span(left)));
        };
        Ok(Lowered::new(
            pre,
            self.binary_value(op, lhs, rhs, lhs_ty, rhs_ty, ty),
        ))
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: ExprId) -> LowerResult<Lowered> {
        let Lowered { prereqs, value } = self.lower_expr(operand)?;
        let value = match op {
            UnaryOp::Neg => match value {
                Expr::Number(n) => Expr::Number(-n),
                other => Expr::unary(UnOp::Neg, other),
            },
            UnaryOp::Plus => value,
            UnaryOp::Not => value.not(),
            UnaryOp::BitNot => self.lib_call(self.names.bit32, self.names.bnot, vec![value]),
        };
        Ok(Lowered::new(prereqs, value))
    }

    fn lower_conditional(
        &mut self,
        cond: ExprId,
        then_value: ExprId,
        else_value: ExprId,
    ) -> LowerResult<Lowered> {
        let Lowered { mut prereqs, value: cond } = self.lower_expr(cond)?;
        let then_value = self.lower_expr(then_value)?;
        let else_value = self.lower_expr(else_value)?;
        if !then_value.has_prereqs() && !else_value.has_prereqs() {
            return Ok(Lowered::new(
                prereqs,
                Expr::if_else(cond, then_value.value, else_value.value),
            ));
        }

        let temp = self.fresh("result");
        prereqs.push(Stmt::local_uninit(vec![temp]));
        let branch = |lowered: Lowered| {
            let mut stmts = lowered.prereqs;
            stmts.push(Stmt::assign(Expr::Ident(temp), lowered.value));
            Block::new(stmts)
        };
        prereqs.push(Stmt::If {
            cond,
            then_block: branch(then_value),
            else_ifs: Vec::new(),
            else_block: Some(branch(else_value)),
        });
        Ok(Lowered::new(prereqs, Expr::Ident(temp)))
    }

    // Object creation

    fn lower_new(
        &mut self,
        id: ExprId,
        args: ExprRange,
        ctor: SymbolId,
        initializer: Option<&Initializer>,
    ) -> LowerResult<Lowered> {
        let ty = self.ty(id);
        let span = self.span(id);
        let args = self.arena.expr_list(args);
        let mut pre = Vec::new();

        match self.sema.well_known(ty) {
            Some(WellKnownType::List | WellKnownType::HashSet | WellKnownType::Dictionary) => {
                let is_set = self.sema.well_known(ty) == Some(WellKnownType::HashSet);
                let fields = match initializer {
                    None => Vec::new(),
                    Some(Initializer::Collection(items)) => {
                        let values = self.ordered(self.arena.expr_list(*items), &mut pre)?;
                        if is_set {
                            values
                                .into_iter()
                                .map(|v| TableField::Keyed(v, Expr::Bool(true)))
                                .collect()
                        } else {
                            values.into_iter().map(TableField::Positional).collect()
                        }
                    }
                    Some(Initializer::Dictionary(entries)) => {
                        let flat: Vec<ExprId> = entries.iter().flat_map(|&(k, v)| [k, v]).collect();
                        let values = self.ordered(&flat, &mut pre)?;
                        let mut values = values.into_iter();
                        let mut fields = Vec::with_capacity(entries.len());
                        while let (Some(k), Some(v)) = (values.next(), values.next()) {
                            fields.push(TableField::Keyed(k, v));
                        }
                        fields
                    }
                    Some(Initializer::Object(_)) => {
                        return Err(LowerError::unsupported(
                            "object initializer on a collection",
                            span,
                        ))
                    }
                };
                return Ok(Lowered::new(pre, Expr::Table(fields)));
            }
            Some(WellKnownType::KeyValuePair) => {
                let values = self.ordered(args, &mut pre)?;
                let mut values = values.into_iter();
                let (Some(key), Some(value)) = (values.next(), values.next()) else {
                    return Err(LowerError::invalid_tree("KeyValuePair arity", span));
                };
                return Ok(Lowered::new(pre, self.key_value_pair(key, value)));
            }
            Some(WellKnownType::Exception) => {
                let values = self.ordered(args, &mut pre)?;
                let value = self
                    .cs(self.names.exception)
                    .member(self.names.new)
                    .call(values);
                return Ok(Lowered::new(pre, value));
            }
            _ => {}
        }

        let Some((symbol, _)) = self.sema.type_symbol_of(ty) else {
            return Err(LowerError::invalid_tree("`new` of a non-class type", span));
        };
        tracing::trace!(?ctor, "lowering object creation");
        let values = self.ordered(args, &mut pre)?;
        let created = self.type_expr(symbol).member(self.names.new).call(values);

        match initializer {
            None => Ok(Lowered::new(pre, created)),
            Some(Initializer::Object(inits)) => {
                let object = self.fresh("object");
                pre.push(Stmt::local(object, created));
                for init in inits {
                    let value = self.expr_into(init.value, &mut pre)?;
                    let target = Expr::Ident(object);
                    match self.sema.symbol(init.symbol) {
                        Some(sym) if Self::is_computed_property(sym) => {
                            pre.push(Stmt::Expr(self.property_set(target, sym, value)));
                        }
                        _ => pre.push(Stmt::assign(target.member(init.name), value)),
                    }
                }
                Ok(Lowered::new(pre, Expr::Ident(object)))
            }
            Some(_) => Err(LowerError::unsupported(
                "collection initializer on a user type",
                span,
            )),
        }
    }

    fn lower_array_creation(&mut self, ty: TypeId, size: ExprId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let size = self.expr_into(size, &mut pre)?;
        let mut args = vec![size];
        if let TypeKind::Array(elem) = self.sema.type_kind(self.sema.types.non_nullable(ty)) {
            let fill = self.default_value(*elem);
            if !matches!(fill, Expr::Nil | Expr::Call { .. }) {
                args.push(fill);
            }
        }
        Ok(Lowered::new(
            pre,
            self.lib_call(self.names.table, self.names.create, args),
        ))
    }

    fn lower_collection(&mut self, ty: TypeId, items: ExprRange) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let values = self.ordered(self.arena.expr_list(items), &mut pre)?;
        let fields = if self.sema.well_known(ty) == Some(WellKnownType::HashSet) {
            values
                .into_iter()
                .map(|v| TableField::Keyed(v, Expr::Bool(true)))
                .collect()
        } else {
            values.into_iter().map(TableField::Positional).collect()
        };
        Ok(Lowered::new(pre, Expr::Table(fields)))
    }

    // Functions

    /// Return type of a lambda converted to `ty`.
    fn lambda_return(&self, ty: TypeId) -> TypeId {
        match self.sema.type_kind(self.sema.types.non_nullable(ty)) {
            TypeKind::Function { ret, .. } => *ret,
            TypeKind::Named { symbol, args } => {
                let well_known = self
                    .sema
                    .symbol(*symbol)
                    .and_then(|s| s.as_type())
                    .and_then(|t| t.well_known);
                match well_known {
                    Some(WellKnownType::Action) => TypeId::VOID,
                    Some(WellKnownType::Func) => args.last().copied().unwrap_or(TypeId::OBJECT),
                    _ => TypeId::OBJECT,
                }
            }
            _ => TypeId::OBJECT,
        }
    }

    fn lower_lambda(
        &mut self,
        ty: TypeId,
        params: &[LambdaParam],
        body: LambdaBody,
        is_async: bool,
    ) -> LowerResult<Lowered> {
        let params: Vec<Param> = params
            .iter()
            .map(|p| Param {
                name: p.name,
                ty: p.ty,
                default: ExprId::INVALID,
                is_params: false,
            })
            .collect();
        let (body, is_generator) = match body {
            LambdaBody::Expr(e) => (MethodBody::Expr(e), false),
            LambdaBody::Block(s) => (MethodBody::Block(s), contains_yield(self.arena, s)),
        };
        let func = self.lower_callable(Callable {
            params: &params,
            body,
            ret: self.lambda_return(ty),
            is_generator,
            annotate_return: false,
        })?;
        let value = if is_async {
            self.wrap_async(func)
        } else {
            Expr::function(func)
        };
        Ok(Lowered::pure(value))
    }

    fn lower_interpolated(&mut self, parts: &[InterpolationPart]) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let mut lowered = Vec::new();
        for part in parts {
            if let InterpolationPart::Expr(e) = part {
                lowered.push(self.lower_expr(*e)?);
            }
        }
        let mut values = self.sequence(lowered, &mut pre).into_iter();
        let mut out = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                InterpolationPart::Text(text) => {
                    out.push(InterpPart::Text(self.text(*text).to_string()));
                }
                InterpolationPart::Expr(e) => {
                    let Some(value) = values.next() else {
                        return Err(LowerError::invalid_tree("interpolation hole", self.span(*e)));
                    };
                    out.push(InterpPart::Expr(value));
                }
            }
        }
        Ok(Lowered::new(pre, Expr::Interpolated(out)))
    }

    // Conversions

    fn lower_cast(&mut self, inner: ExprId, target: TypeId) -> LowerResult<Lowered> {
        let source = self.ty(inner);
        let Lowered { prereqs, value } = self.lower_expr(inner)?;
        let types = &self.sema.types;
        let value = if types.is_integral(target) && types.is_numeric(source) && !types.is_integral(source)
        {
            self.truncate(value)
        } else if types.is_numeric(target) && types.is_numeric(source) {
            value
        } else if target == TypeId::OBJECT || target == TypeId::DYNAMIC {
            value
        } else {
            match self.sema.type_symbol_of(target) {
                Some((_, sym)) if sym.decl_kind == TypeDeclKind::Enum => value,
                Some(_) => Expr::Cast {
                    expr: Box::new(value),
                    ty: Box::new(self.types.map(target)),
                },
                None => value,
            }
        };
        Ok(Lowered::new(prereqs, value))
    }

    /// `x as T` → `if CS.is(x, T) then x else nil`
    fn lower_as(&mut self, inner: ExprId, target: TypeId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let value = self.expr_into(inner, &mut pre)?;
        let value = self.spill(value, "value", &mut pre);
        let test = self.cs_call(self.names.is, vec![value.clone(), self.type_value(target)]);
        Ok(Lowered::new(pre, Expr::if_else(test, value, Expr::Nil)))
    }
}
