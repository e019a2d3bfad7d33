//! Programmatic construction of source units.
//!
//! The front end that produces real units lives outside this workspace; the
//! builder is how drivers, fixtures and tests assemble a resolved tree
//! without a parser. Every node gets [`Span::DUMMY`] unless a span is set
//! with [`AstBuilder::at`].

use crate::ast::{
    BinaryOp, Expr, ExprKind, LambdaBody, LambdaParam, LocalDecl, Pattern, PatternKind, Stmt,
    StmtKind, TypeDecl,
};
use crate::{
    ExprId, ExprRange, Name, PatternId, SourceArena, SourceUnit, Span, StmtId, StmtRange,
    StringInterner, SymbolId, TypeId,
};

pub struct AstBuilder<'a> {
    interner: &'a StringInterner,
    arena: SourceArena,
    span: Span,
    types: Vec<TypeDecl>,
    statements: Vec<StmtId>,
}

impl<'a> AstBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        AstBuilder {
            interner,
            arena: SourceArena::new(),
            span: Span::DUMMY,
            types: Vec::new(),
            statements: Vec::new(),
        }
    }

    /// Span stamped on nodes allocated from now on.
    pub fn at(&mut self, span: Span) -> &mut Self {
        self.span = span;
        self
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    pub fn arena(&self) -> &SourceArena {
        &self.arena
    }

    // Expressions

    pub fn expr(&mut self, kind: ExprKind, ty: TypeId) -> ExprId {
        self.arena.alloc_expr(Expr::new(kind, self.span, ty))
    }

    pub fn exprs(&mut self, ids: &[ExprId]) -> ExprRange {
        self.arena.alloc_expr_list(ids)
    }

    pub fn null(&mut self) -> ExprId {
        self.expr(ExprKind::Null, TypeId::NULL)
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.expr(ExprKind::Bool(value), TypeId::BOOL)
    }

    pub fn int(&mut self, value: i64) -> ExprId {
        self.expr(ExprKind::Int(value), TypeId::INT)
    }

    pub fn float(&mut self, value: f64) -> ExprId {
        self.expr(ExprKind::Float(value), TypeId::DOUBLE)
    }

    pub fn string(&mut self, text: &str) -> ExprId {
        let name = self.name(text);
        self.expr(ExprKind::String(name), TypeId::STRING)
    }

    /// A local or parameter reference.
    pub fn local(&mut self, name: &str, ty: TypeId) -> ExprId {
        let name = self.name(name);
        self.expr(
            ExprKind::Ident {
                name,
                symbol: SymbolId::NONE,
            },
            ty,
        )
    }

    /// A name bound to a declared symbol (field, property, method, type member).
    pub fn ident(&mut self, name: &str, symbol: SymbolId, ty: TypeId) -> ExprId {
        let name = self.name(name);
        self.expr(ExprKind::Ident { name, symbol }, ty)
    }

    pub fn this(&mut self, ty: TypeId) -> ExprId {
        self.expr(ExprKind::This, ty)
    }

    pub fn type_ref(&mut self, symbol: SymbolId, ty: TypeId) -> ExprId {
        self.expr(ExprKind::TypeRef(symbol), ty)
    }

    pub fn member(&mut self, receiver: ExprId, name: &str, symbol: SymbolId, ty: TypeId) -> ExprId {
        let name = self.name(name);
        self.expr(
            ExprKind::Member {
                receiver,
                name,
                symbol,
            },
            ty,
        )
    }

    pub fn element(&mut self, receiver: ExprId, index: ExprId, ty: TypeId) -> ExprId {
        self.expr(ExprKind::Element { receiver, index }, ty)
    }

    pub fn call(&mut self, callee: ExprId, args: &[ExprId], method: SymbolId, ty: TypeId) -> ExprId {
        let args = self.exprs(args);
        self.expr(
            ExprKind::Invocation {
                callee,
                args,
                method,
            },
            ty,
        )
    }

    pub fn new_object(&mut self, ctor: SymbolId, args: &[ExprId], ty: TypeId) -> ExprId {
        let args = self.exprs(args);
        self.expr(
            ExprKind::New {
                args,
                ctor,
                initializer: None,
            },
            ty,
        )
    }

    pub fn collection(&mut self, items: &[ExprId], ty: TypeId) -> ExprId {
        let items = self.exprs(items);
        self.expr(ExprKind::Collection(items), ty)
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId, ty: TypeId) -> ExprId {
        self.expr(ExprKind::Binary { op, left, right }, ty)
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        let ty = self.arena.expr(target).ty;
        self.expr(ExprKind::Assign { target, value }, ty)
    }

    pub fn range(&mut self, start: ExprId, end: ExprId, step: Option<ExprId>, ty: TypeId) -> ExprId {
        self.expr(
            ExprKind::Range {
                start,
                end,
                step: step.unwrap_or(ExprId::INVALID),
            },
            ty,
        )
    }

    pub fn lambda(&mut self, params: Vec<LambdaParam>, body: LambdaBody, ty: TypeId) -> ExprId {
        self.expr(
            ExprKind::Lambda {
                params,
                body,
                is_async: false,
            },
            ty,
        )
    }

    // Statements

    pub fn stmt(&mut self, kind: StmtKind) -> StmtId {
        self.arena.alloc_stmt(Stmt::new(kind, self.span))
    }

    pub fn stmts(&mut self, ids: &[StmtId]) -> StmtRange {
        self.arena.alloc_stmt_list(ids)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.stmt(StmtKind::Expr(expr))
    }

    pub fn let_(&mut self, name: &str, ty: TypeId, init: Option<ExprId>) -> StmtId {
        let name = self.name(name);
        self.stmt(StmtKind::Local(vec![LocalDecl {
            name,
            ty,
            init: init.unwrap_or(ExprId::INVALID),
        }]))
    }

    pub fn block(&mut self, body: &[StmtId]) -> StmtId {
        let range = self.stmts(body);
        self.stmt(StmtKind::Block(range))
    }

    pub fn ret(&mut self, value: Option<ExprId>) -> StmtId {
        self.stmt(StmtKind::Return(value.unwrap_or(ExprId::INVALID)))
    }

    pub fn if_(&mut self, cond: ExprId, then_branch: StmtId, else_branch: Option<StmtId>) -> StmtId {
        self.stmt(StmtKind::If {
            cond,
            then_branch,
            else_branch: else_branch.unwrap_or(StmtId::INVALID),
        })
    }

    pub fn while_(&mut self, cond: ExprId, body: StmtId) -> StmtId {
        self.stmt(StmtKind::While { cond, body })
    }

    pub fn yield_return(&mut self, value: ExprId) -> StmtId {
        self.stmt(StmtKind::YieldReturn(value))
    }

    // Patterns

    pub fn pattern(&mut self, kind: PatternKind) -> PatternId {
        self.arena.alloc_pattern(Pattern {
            kind,
            span: self.span,
        })
    }

    pub fn constant_pattern(&mut self, value: ExprId) -> PatternId {
        self.pattern(PatternKind::Constant(value))
    }

    pub fn var_pattern(&mut self, name: &str) -> PatternId {
        let name = self.name(name);
        self.pattern(PatternKind::Declaration { name, ty: None })
    }

    pub fn discard(&mut self) -> PatternId {
        self.pattern(PatternKind::Discard)
    }

    // Unit assembly

    pub fn add_type(&mut self, decl: TypeDecl) {
        self.types.push(decl);
    }

    /// Append a top-level statement.
    pub fn top_level(&mut self, stmt: StmtId) {
        self.statements.push(stmt);
    }

    pub fn finish(self, unit_name: &str) -> SourceUnit {
        let AstBuilder {
            interner,
            mut arena,
            types,
            statements,
            ..
        } = self;
        let statements = arena.alloc_stmt_list(&statements);
        SourceUnit {
            name: interner.intern(unit_name),
            arena,
            types,
            statements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_collects_top_level_statements() {
        let interner = StringInterner::new();
        let mut b = AstBuilder::new(&interner);
        let one = b.int(1);
        let s = b.expr_stmt(one);
        b.top_level(s);
        let unit = b.finish("main.cs");
        assert_eq!(unit.arena.stmt_list(unit.statements), &[s]);
        assert_eq!(interner.lookup(unit.name), "main.cs");
    }

    #[test]
    fn assign_takes_target_type() {
        let interner = StringInterner::new();
        let mut b = AstBuilder::new(&interner);
        let x = b.local("x", TypeId::STRING);
        let v = b.string("a");
        let assign = b.assign(x, v);
        assert_eq!(b.arena().expr(assign).ty, TypeId::STRING);
    }
}
