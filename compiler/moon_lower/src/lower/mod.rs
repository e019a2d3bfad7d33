//! Expression and statement lowering.
//!
//! Every expression lowers to a [`Lowered`]: the statements that must run
//! first (prerequisites) and a side-effect-free value expression. Statement
//! lowering splices prerequisites in front of the statement that consumed
//! the value, so the source's left-to-right evaluation order survives.

mod access;
mod assign;
mod builtins;
mod calls;
mod expr;
mod foreach;
pub(crate) mod names;
mod stmt;

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{MethodBody, Param};
use moon_ir::luau::{BinOp, Binding, Block, Expr, Function, Stmt, TableField, TypeInfo};
use moon_ir::{ExprId, Name, SemanticModel, SourceArena, Span, StringInterner, SymbolId, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::context::CompileOptions;
use crate::control_flow::Frame;
use crate::metadata::MetadataRegistry;
use crate::stack::ensure_sufficient_stack;
use crate::types::TypeMapper;
pub(crate) use foreach::IterShape;
use names::RuntimeNames;

/// Whether control cannot continue past the last statement.
pub(crate) fn terminates(stmts: &[Stmt]) -> bool {
    matches!(
        stmts.last(),
        Some(Stmt::Return(_) | Stmt::Break | Stmt::Continue)
    )
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn number(n: usize) -> Expr {
    Expr::Number(n as f64)
}

/// 1-based Luau index of the 0-based position `i`.
pub(crate) fn lua_index(i: usize) -> Expr {
    number(i + 1)
}

/// Result of lowering one expression.
#[derive(Clone, PartialEq, Debug)]
pub struct Lowered {
    /// Statements that must execute before `value` is read.
    pub prereqs: Vec<Stmt>,
    pub value: Expr,
}

impl Lowered {
    pub fn new(prereqs: Vec<Stmt>, value: Expr) -> Self {
        Lowered { prereqs, value }
    }

    /// A value with no prerequisites.
    pub fn pure(value: Expr) -> Self {
        Lowered {
            prereqs: Vec::new(),
            value,
        }
    }

    pub fn has_prereqs(&self) -> bool {
        !self.prereqs.is_empty()
    }
}

/// The type whose members are being lowered.
#[derive(Copy, Clone, Debug)]
pub(crate) struct TypeScope {
    /// Mangled name of the base class, for `base.M()` calls.
    pub base: Option<Name>,
}

/// A function-like body to lower: method, accessor, local function, lambda.
pub(crate) struct Callable<'p> {
    pub params: &'p [Param],
    pub body: MethodBody,
    pub ret: TypeId,
    pub is_generator: bool,
    /// Annotate the return type.
    pub annotate_return: bool,
}

/// Lowering state for one source unit.
pub(crate) struct Lowerer<'a> {
    pub(crate) arena: &'a SourceArena,
    pub(crate) sema: &'a SemanticModel,
    pub(crate) interner: &'a StringInterner,
    pub(crate) registry: &'a MetadataRegistry,
    pub(crate) options: CompileOptions,
    pub(crate) types: TypeMapper<'a>,
    pub(crate) names: RuntimeNames,
    /// Control-flow frames from the enclosing function boundary inward.
    pub(crate) flow: Vec<Frame>,
    /// Values standing in for `ConditionalReceiver` inside `?.` chains.
    pub(crate) conditional_receivers: Vec<Expr>,
    /// Exception variables of the enclosing catch clauses, for `throw;`.
    pub(crate) catch_vars: SmallVec<[Name; 2]>,
    pub(crate) scope: Option<TypeScope>,
    temp_counters: FxHashMap<&'static str, u32>,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(
        arena: &'a SourceArena,
        sema: &'a SemanticModel,
        interner: &'a StringInterner,
        registry: &'a MetadataRegistry,
        options: CompileOptions,
    ) -> Self {
        Lowerer {
            arena,
            sema,
            interner,
            registry,
            options,
            types: TypeMapper::new(sema, interner, registry),
            names: RuntimeNames::new(interner),
            flow: Vec::new(),
            conditional_receivers: Vec::new(),
            catch_vars: SmallVec::new(),
            scope: None,
            temp_counters: FxHashMap::default(),
        }
    }

    // Temporaries

    /// A fresh temporary: `_base`, then `_base_1`, `_base_2`, ...
    pub(crate) fn fresh(&mut self, base: &'static str) -> Name {
        let counter = self.temp_counters.entry(base).or_insert(0);
        let text = if *counter == 0 {
            format!("_{base}")
        } else {
            format!("_{base}_{counter}")
        };
        *counter += 1;
        self.interner.intern_owned(text)
    }

    /// Temporaries restart for every top-level function.
    pub(crate) fn reset_temps(&mut self) {
        self.temp_counters.clear();
    }

    /// Bind `value` to a fresh local unless it is already simple.
    pub(crate) fn spill(&mut self, value: Expr, base: &'static str, pre: &mut Vec<Stmt>) -> Expr {
        if value.is_simple() {
            return value;
        }
        let temp = self.fresh(base);
        pre.push(Stmt::local(temp, value));
        Expr::Ident(temp)
    }

    // Node access

    pub(crate) fn ty(&self, id: ExprId) -> TypeId {
        self.arena.expr(id).ty
    }

    pub(crate) fn span(&self, id: ExprId) -> Span {
        self.arena.expr(id).span
    }

    pub(crate) fn text(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    /// Emitted name of a type symbol.
    pub(crate) fn type_name(&self, symbol: SymbolId) -> Name {
        self.registry.mangled_name(symbol, self.sema, self.interner)
    }

    pub(crate) fn type_expr(&self, symbol: SymbolId) -> Expr {
        Expr::Ident(self.type_name(symbol))
    }

    /// `CS.member`
    pub(crate) fn cs(&self, member: Name) -> Expr {
        Expr::Ident(self.names.cs).member(member)
    }

    /// `CS.member(args)`
    pub(crate) fn cs_call(&self, member: Name, args: Vec<Expr>) -> Expr {
        self.cs(member).call(args)
    }

    /// `library.function(args)`, e.g. `bit32.band(a, b)`.
    pub(crate) fn lib_call(&self, library: Name, function: Name, args: Vec<Expr>) -> Expr {
        Expr::Ident(library).member(function).call(args)
    }

    /// `(math.modf(value))`: the integral part, rounded toward zero.
    pub(crate) fn truncate(&self, value: Expr) -> Expr {
        Expr::Paren(Box::new(self.lib_call(
            self.names.math,
            self.names.modf,
            vec![value],
        )))
    }

    pub(crate) fn global_call(&self, function: Name, args: Vec<Expr>) -> Expr {
        Expr::Ident(function).call(args)
    }

    /// Implicit receiver for instance members: `self`.
    pub(crate) fn self_expr(&self) -> Expr {
        Expr::Ident(self.names.self_)
    }

    // Expressions

    pub(crate) fn lower_expr(&mut self, id: ExprId) -> LowerResult<Lowered> {
        ensure_sufficient_stack(|| self.lower_expr_kind(id))
    }

    /// Lower `id`, appending its prerequisites to `pre`.
    pub(crate) fn expr_into(&mut self, id: ExprId, pre: &mut Vec<Stmt>) -> LowerResult<Expr> {
        let Lowered { prereqs, value } = self.lower_expr(id)?;
        pre.extend(prereqs);
        Ok(value)
    }

    /// Lower operands evaluated left to right.
    pub(crate) fn ordered(&mut self, ids: &[ExprId], pre: &mut Vec<Stmt>) -> LowerResult<Vec<Expr>> {
        let parts = ids
            .iter()
            .map(|&id| self.lower_expr(id))
            .collect::<LowerResult<Vec<_>>>()?;
        Ok(self.sequence(parts, pre))
    }

    /// Splice already-lowered operands into `pre` in order.
    ///
    /// When a later operand has prerequisites, every earlier operand that
    /// those statements could observe changing is first copied into a
    /// temporary.
    pub(crate) fn sequence(&mut self, parts: Vec<Lowered>, pre: &mut Vec<Stmt>) -> Vec<Expr> {
        let mut later_has_prereqs = vec![false; parts.len()];
        let mut seen = false;
        for (i, part) in parts.iter().enumerate().rev() {
            later_has_prereqs[i] = seen;
            seen |= part.has_prereqs();
        }

        let mut values = Vec::with_capacity(parts.len());
        for (part, spill) in parts.into_iter().zip(later_has_prereqs) {
            pre.extend(part.prereqs);
            let stable = part.value.is_constant() || part.value == self.self_expr();
            if spill && !stable {
                let temp = self.fresh("arg");
                pre.push(Stmt::local(temp, part.value));
                values.push(Expr::Ident(temp));
            } else {
                values.push(part.value);
            }
        }
        values
    }

    /// Receiver and arguments of a call, in evaluation order.
    pub(crate) fn lower_args(
        &mut self,
        receiver: Option<Lowered>,
        args: &[ExprId],
        pre: &mut Vec<Stmt>,
    ) -> LowerResult<(Option<Expr>, Vec<Expr>)> {
        let mut parts = Vec::with_capacity(args.len() + 1);
        let has_receiver = receiver.is_some();
        parts.extend(receiver);
        for &arg in args {
            parts.push(self.lower_expr(arg)?);
        }
        let mut values = self.sequence(parts, pre).into_iter();
        let receiver = if has_receiver { values.next() } else { None };
        Ok((receiver, values.collect()))
    }

    // Functions

    pub(crate) fn with_frame<R>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> LowerResult<R>,
    ) -> LowerResult<(R, Frame)> {
        self.flow.push(frame);
        let result = f(self);
        let frame = self.flow.pop();
        let value = result?;
        match frame {
            Some(frame) => Ok((value, frame)),
            None => Err(LowerError::invalid_tree("unbalanced control-flow frames", Span::DUMMY)),
        }
    }

    /// Parameter list, `params` tail and default-value prologue.
    pub(crate) fn lower_params(&mut self, params: &[Param]) -> LowerResult<(Function, Vec<Stmt>)> {
        let mut func = Function::default();
        let mut prologue = Vec::new();
        for param in params {
            if param.is_params {
                func.variadic = Some(Some(self.types.map_params_element(param.ty)));
                prologue.push(Stmt::local(
                    param.name,
                    Expr::Table(vec![TableField::Positional(Expr::Vararg)]),
                ));
                continue;
            }
            func.params
                .push(Binding::typed(param.name, self.types.map(param.ty)));
            if let Some(default) = param.default.present() {
                let mut then = Vec::new();
                let value = self.expr_into(default, &mut then)?;
                then.push(Stmt::assign(Expr::Ident(param.name), value));
                prologue.push(Stmt::if_then(
                    Expr::binary(BinOp::Eq, Expr::Ident(param.name), Expr::Nil),
                    Block::new(then),
                ));
            }
        }
        Ok((func, prologue))
    }

    /// Lower a function-like body into a [`Function`].
    pub(crate) fn lower_callable(&mut self, callable: Callable<'_>) -> LowerResult<Function> {
        let (mut func, prologue) = self.lower_params(callable.params)?;
        let frame = Frame::Function {
            generator: callable.is_generator,
        };
        let (body, _) = self.with_frame(frame, |this| {
            let mut body = prologue;
            match callable.body {
                MethodBody::Block(stmt) if callable.is_generator => {
                    body.extend(this.lower_generator(stmt, callable.ret)?.stmts);
                }
                MethodBody::Block(stmt) => body.extend(this.lower_block(stmt)?.stmts),
                MethodBody::Expr(expr) => {
                    let Lowered { prereqs, value } = this.lower_expr(expr)?;
                    body.extend(prereqs);
                    if this.returns_value(callable.ret) {
                        body.push(Stmt::ret(value));
                    } else if value.is_call() {
                        body.push(Stmt::Expr(value));
                    }
                }
                MethodBody::None => {}
            }
            Ok(body)
        })?;
        func.body = Block::new(body);
        if callable.annotate_return {
            func.ret = Some(self.types.map_return(callable.ret));
        }
        Ok(func)
    }

    /// Whether an expression body of this return type produces a value.
    pub(crate) fn returns_value(&self, ret: TypeId) -> bool {
        if ret == TypeId::VOID {
            return false;
        }
        match self.types.map_return(ret) {
            TypeInfo::Tuple { elements, variadic } => !elements.is_empty() || variadic.is_some(),
            _ => true,
        }
    }

    /// `CS.async(function(..) .. end)`
    pub(crate) fn wrap_async(&self, func: Function) -> Expr {
        self.cs_call(self.names.async_, vec![Expr::function(func)])
    }
}

#[cfg(test)]
mod tests;
