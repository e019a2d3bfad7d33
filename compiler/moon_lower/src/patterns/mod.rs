//! Pattern-Matching Compiler.
//!
//! A pattern compiles against a subject expression into a [`Compiled`]: the
//! structural tests that decide the match and the bindings it introduces.
//! Sub-patterns are compiled against access expressions rooted at the
//! subject (`s[2]`, `s.Inner.X`), so nested patterns need no temporaries.
//! The subject itself must already be a simple expression.
//!
//! `switch` statements, `switch` expressions and `is` all consume the same
//! [`Compiled`] form; see [`switch`].

mod switch;

use moon_diagnostic::{LowerError, LowerResult};
use moon_ir::ast::{PatternKind, RelationalOp, SlicePattern};
use moon_ir::luau::{BinOp, Block, Expr, Stmt, UnOp};
use moon_ir::sema::{
    Primitive, SymbolKind, TypeDeclKind, TypeKind, WellKnownMember, WellKnownType,
};
use moon_ir::{ExprId, Name, PatternId, SymbolId, TypeId};

use crate::lower::{lua_index, number, Lowered, Lowerer};

/// Tests and bindings of one compiled pattern.
#[derive(Clone, PartialEq, Debug, Default)]
pub(crate) struct Compiled {
    /// Conjunction, in evaluation order. Empty matches everything.
    pub conditions: Vec<Expr>,
    /// `name = access`, valid once every condition holds.
    pub bindings: Vec<(Name, Expr)>,
}

impl Compiled {
    /// The conditions joined with `and`.
    pub(crate) fn test(&self) -> Expr {
        conjunction(self.conditions.clone())
    }

    pub(crate) fn is_irrefutable(&self) -> bool {
        self.conditions.is_empty()
    }
}

pub(crate) fn conjunction(conditions: Vec<Expr>) -> Expr {
    conditions
        .into_iter()
        .reduce(|acc, c| Expr::binary(BinOp::And, acc, c))
        .unwrap_or(Expr::Bool(true))
}

fn relational(op: RelationalOp) -> BinOp {
    match op {
        RelationalOp::Lt => BinOp::Lt,
        RelationalOp::LtEq => BinOp::LtEq,
        RelationalOp::Gt => BinOp::Gt,
        RelationalOp::GtEq => BinOp::GtEq,
    }
}

/// `#s`
fn length(subject: &Expr) -> Expr {
    Expr::unary(UnOp::Len, subject.clone())
}

impl Lowerer<'_> {
    /// `type(s) == "kind"`
    fn luau_type_is(&self, subject: &Expr, kind: &str) -> Expr {
        Expr::binary(
            BinOp::Eq,
            self.global_call(self.names.type_, vec![subject.clone()]),
            Expr::string(kind),
        )
    }

    /// Runtime test that `subject` holds a (non-null) `ty`.
    pub(crate) fn type_test(&self, subject: &Expr, ty: TypeId) -> Expr {
        let ty = self.sema.types.non_nullable(ty);
        match self.sema.type_kind(ty) {
            TypeKind::Primitive(p) => match p {
                Primitive::Bool => self.luau_type_is(subject, "boolean"),
                Primitive::Char | Primitive::String => self.luau_type_is(subject, "string"),
                p if p.is_numeric() => self.luau_type_is(subject, "number"),
                _ => Self::not_nil(subject.clone()),
            },
            TypeKind::Nullable(inner) => self.type_test(subject, *inner),
            TypeKind::Array(_) | TypeKind::Tuple(_) => self.luau_type_is(subject, "table"),
            TypeKind::Function { .. } => self.luau_type_is(subject, "function"),
            TypeKind::Named { symbol, .. } => match self.sema.type_symbol_of(ty) {
                Some((_, sym)) if sym.well_known.is_some() => match sym.well_known {
                    Some(WellKnownType::String) => self.luau_type_is(subject, "string"),
                    Some(WellKnownType::Action | WellKnownType::Func) => {
                        self.luau_type_is(subject, "function")
                    }
                    _ => self.luau_type_is(subject, "table"),
                },
                Some((_, sym)) if sym.decl_kind == TypeDeclKind::Enum => {
                    self.luau_type_is(subject, "number")
                }
                Some(_) => self.cs_call(
                    self.names.is,
                    vec![subject.clone(), self.type_expr(*symbol)],
                ),
                None => Self::not_nil(subject.clone()),
            },
            TypeKind::TypeParam { .. } | TypeKind::Error => Self::not_nil(subject.clone()),
        }
    }

    /// Whether values of `ty` can be `nil` at runtime.
    fn may_be_nil(&self, ty: TypeId) -> bool {
        let types = &self.sema.types;
        match types.kind(ty) {
            TypeKind::Nullable(_) => true,
            TypeKind::Primitive(p) => matches!(
                p,
                Primitive::Object | Primitive::Dynamic | Primitive::String | Primitive::Null
            ),
            TypeKind::Named { .. } => !matches!(
                self.sema.type_symbol_of(ty).map(|(_, s)| s.decl_kind),
                Some(TypeDeclKind::Struct | TypeDeclKind::Enum)
            ),
            _ => true,
        }
    }

    /// Element type of an indexable `ty`, for list patterns.
    fn element_type(&self, ty: TypeId) -> TypeId {
        match self.sema.type_kind(self.sema.types.non_nullable(ty)) {
            TypeKind::Array(elem) => *elem,
            _ => self
                .sema
                .type_args(ty)
                .first()
                .copied()
                .unwrap_or(TypeId::OBJECT),
        }
    }

    /// A constant used inside a pattern. Constants never need statements.
    fn pattern_constant(&mut self, expr: ExprId) -> LowerResult<Expr> {
        let Lowered { prereqs, value } = self.lower_expr(expr)?;
        if !prereqs.is_empty() {
            return Err(LowerError::invalid_tree(
                "pattern constant with side effects",
                self.span(expr),
            ));
        }
        Ok(value)
    }

    /// Compile `pattern` against `subject`, whose static type is `ty`.
    pub(crate) fn compile_pattern(
        &mut self,
        pattern: PatternId,
        subject: &Expr,
        ty: TypeId,
    ) -> LowerResult<Compiled> {
        let mut compiled = Compiled::default();
        self.compile_into(pattern, subject, ty, &mut compiled)?;
        Ok(compiled)
    }

    fn compile_into(
        &mut self,
        pattern: PatternId,
        subject: &Expr,
        ty: TypeId,
        out: &mut Compiled,
    ) -> LowerResult<()> {
        let node = self.arena.pattern(pattern);
        let span = node.span;
        match &node.kind {
            PatternKind::Discard => {}
            PatternKind::Constant(expr) => {
                let value = self.pattern_constant(*expr)?;
                out.conditions
                    .push(Expr::binary(BinOp::Eq, subject.clone(), value));
            }
            PatternKind::Declaration { name, ty: declared } => {
                if let Some(declared) = declared {
                    out.conditions.push(self.type_test(subject, *declared));
                }
                out.bindings.push((*name, subject.clone()));
            }
            PatternKind::Type(target) => out.conditions.push(self.type_test(subject, *target)),
            PatternKind::Relational { op, value } => {
                let value = self.pattern_constant(*value)?;
                if self.may_be_nil(ty) {
                    out.conditions.push(self.luau_type_is(subject, "number"));
                }
                out.conditions
                    .push(Expr::binary(relational(*op), subject.clone(), value));
            }
            PatternKind::Not(inner) => {
                let inner = self.compile_pattern(*inner, subject, ty)?;
                if !inner.bindings.is_empty() {
                    return Err(LowerError::unsupported("bindings under `not`", span));
                }
                out.conditions.push(inner.test().not());
            }
            PatternKind::And(left, right) => {
                self.compile_into(*left, subject, ty, out)?;
                self.compile_into(*right, subject, ty, out)?;
            }
            PatternKind::Or(left, right) => {
                let left = self.compile_pattern(*left, subject, ty)?;
                let right = self.compile_pattern(*right, subject, ty)?;
                if !left.bindings.is_empty() || !right.bindings.is_empty() {
                    return Err(LowerError::unsupported("bindings under `or`", span));
                }
                if !left.is_irrefutable() && !right.is_irrefutable() {
                    out.conditions
                        .push(Expr::binary(BinOp::Or, left.test(), right.test()));
                }
            }
            PatternKind::List {
                head,
                slice,
                tail,
                binding,
            } => self.compile_list(subject, ty, head, slice.as_ref(), tail, *binding, out)?,
            PatternKind::Tuple(elements) => {
                let element_types: Vec<TypeId> =
                    match self.sema.type_kind(self.sema.types.non_nullable(ty)) {
                        TypeKind::Tuple(elems) => elems.iter().map(|e| e.ty).collect(),
                        _ => Vec::new(),
                    };
                if self.may_be_nil(ty) {
                    out.conditions.push(self.luau_type_is(subject, "table"));
                }
                for (i, &element) in elements.iter().enumerate() {
                    let element_ty = element_types.get(i).copied().unwrap_or(TypeId::OBJECT);
                    let access = subject.clone().index(lua_index(i));
                    self.compile_into(element, &access, element_ty, out)?;
                }
            }
            PatternKind::Property {
                ty: declared,
                fields,
                binding,
            } => {
                match declared {
                    Some(declared) => out.conditions.push(self.type_test(subject, *declared)),
                    None if self.may_be_nil(ty) => {
                        out.conditions.push(Self::not_nil(subject.clone()));
                    }
                    None => {}
                }
                for field in fields {
                    let (access, field_ty) = self.field_access(subject, field.name, field.symbol);
                    self.compile_into(field.pattern, &access, field_ty, out)?;
                }
                if let Some(name) = binding {
                    out.bindings.push((*name, subject.clone()));
                }
            }
        }
        Ok(())
    }

    /// `[a, b, ..rest, z]`
    #[allow(clippy::too_many_arguments)]
    fn compile_list(
        &mut self,
        subject: &Expr,
        ty: TypeId,
        head: &[PatternId],
        slice: Option<&SlicePattern>,
        tail: &[PatternId],
        binding: Option<Name>,
        out: &mut Compiled,
    ) -> LowerResult<()> {
        let fixed = head.len() + tail.len();
        if self.may_be_nil(ty) {
            out.conditions.push(self.luau_type_is(subject, "table"));
        }
        let op = if slice.is_some() { BinOp::GtEq } else { BinOp::Eq };
        out.conditions
            .push(Expr::binary(op, length(subject), number(fixed)));

        let element_ty = self.element_type(ty);
        for (i, &element) in head.iter().enumerate() {
            let access = subject.clone().index(lua_index(i));
            self.compile_into(element, &access, element_ty, out)?;
        }
        for (k, &element) in tail.iter().enumerate() {
            let from_end = tail.len() - 1 - k;
            let index = if from_end == 0 {
                length(subject)
            } else {
                Expr::binary(BinOp::Sub, length(subject), number(from_end))
            };
            let access = subject.clone().index(index);
            self.compile_into(element, &access, element_ty, out)?;
        }

        if let Some(SlicePattern {
            binding: Some(name),
        }) = slice
        {
            let end = if tail.is_empty() {
                length(subject)
            } else {
                Expr::binary(BinOp::Sub, length(subject), number(tail.len()))
            };
            let rest = self.cs_call(
                self.names.slice,
                vec![subject.clone(), lua_index(head.len()), end],
            );
            out.bindings.push((*name, rest));
        }
        if let Some(name) = binding {
            out.bindings.push((name, subject.clone()));
        }
        Ok(())
    }

    /// Access expression and type of `subject.Name` inside a property pattern.
    fn field_access(
        &self,
        subject: &Expr,
        name: Name,
        symbol: SymbolId,
    ) -> (Expr, TypeId) {
        let Some(sym) = self.sema.symbol(symbol) else {
            return (subject.clone().member(name), TypeId::OBJECT);
        };
        match &sym.kind {
            SymbolKind::Property {
                well_known: Some(WellKnownMember::CollectionCount | WellKnownMember::StringLength),
                ty,
                ..
            } => (length(subject), *ty),
            SymbolKind::Property { ty, .. } if Self::is_computed_property(sym) => {
                (self.property_get(subject.clone(), sym), *ty)
            }
            SymbolKind::Property { ty, .. } | SymbolKind::Field { ty, .. } => {
                (subject.clone().member(name), *ty)
            }
            _ => (subject.clone().member(name), TypeId::OBJECT),
        }
    }

    /// Predeclare the bindings, then assign them where the pattern matched.
    pub(crate) fn assign_bindings(compiled: &Compiled, block: &mut Vec<Stmt>) {
        for (name, access) in &compiled.bindings {
            block.push(Stmt::assign(Expr::Ident(*name), access.clone()));
        }
    }

    /// `local name = access` for each binding.
    pub(crate) fn declare_bindings(compiled: &Compiled, block: &mut Vec<Stmt>) {
        for (name, access) in &compiled.bindings {
            block.push(Stmt::local(*name, access.clone()));
        }
    }

    /// The subject of a match as a simple expression, with its type.
    pub(crate) fn match_subject(
        &mut self,
        subject: ExprId,
        pre: &mut Vec<Stmt>,
    ) -> LowerResult<(Expr, TypeId)> {
        let ty = self.ty(subject);
        let value = self.expr_into(subject, pre)?;
        let value = if value.is_simple() {
            value
        } else {
            let temp = self.fresh("subject");
            pre.push(Stmt::local(temp, value));
            Expr::Ident(temp)
        };
        Ok((value, ty))
    }

    /// `x is pattern`
    ///
    /// Without bindings this is just the test. With bindings:
    ///
    /// ```text
    /// local x
    /// local _matched = false
    /// if <test> then
    ///   x = <access>
    ///   _matched = true
    /// end
    /// ```
    pub(crate) fn lower_is(&mut self, subject: ExprId, pattern: PatternId) -> LowerResult<Lowered> {
        let mut pre = Vec::new();
        let (subject, ty) = self.match_subject(subject, &mut pre)?;
        let compiled = self.compile_pattern(pattern, &subject, ty)?;
        if compiled.bindings.is_empty() {
            return Ok(Lowered::new(pre, compiled.test()));
        }

        pre.push(Stmt::local_uninit(
            compiled.bindings.iter().map(|(name, _)| *name).collect(),
        ));
        let matched = self.fresh("matched");
        pre.push(Stmt::local(matched, Expr::Bool(false)));
        let mut then = Vec::new();
        Self::assign_bindings(&compiled, &mut then);
        then.push(Stmt::assign(Expr::Ident(matched), Expr::Bool(true)));
        if compiled.is_irrefutable() {
            pre.extend(then);
        } else {
            pre.push(Stmt::if_then(compiled.test(), Block::new(then)));
        }
        Ok(Lowered::new(pre, Expr::Ident(matched)))
    }
}
