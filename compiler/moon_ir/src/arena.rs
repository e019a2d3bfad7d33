//! Flat storage for one Source Unit.

use crate::ast::{Expr, Pattern, Stmt, TypeDecl};
use crate::{ExprId, ExprRange, Name, PatternId, StmtId, StmtRange};

/// Arena holding every expression, statement and pattern of a unit.
#[derive(Clone, Debug, Default)]
pub struct SourceArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    patterns: Vec<Pattern>,
    expr_lists: Vec<ExprId>,
    stmt_lists: Vec<StmtId>,
}

fn next_index(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("source arena exceeded u32::MAX nodes"))
}

impl SourceArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(next_index(self.exprs.len()));
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(next_index(self.stmts.len()));
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_pattern(&mut self, pattern: Pattern) -> PatternId {
        let id = PatternId::new(next_index(self.patterns.len()));
        self.patterns.push(pattern);
        id
    }

    pub fn alloc_expr_list(&mut self, ids: &[ExprId]) -> ExprRange {
        let start = next_index(self.expr_lists.len());
        self.expr_lists.extend_from_slice(ids);
        ExprRange::new(start, next_index(ids.len()))
    }

    pub fn alloc_stmt_list(&mut self, ids: &[StmtId]) -> StmtRange {
        let start = next_index(self.stmt_lists.len());
        self.stmt_lists.extend_from_slice(ids);
        StmtRange::new(start, next_index(ids.len()))
    }

    /// Panics on an invalid id: the front end guarantees a well-formed tree.
    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn pattern(&self, id: PatternId) -> &Pattern {
        &self.patterns[id.index()]
    }

    pub fn expr_list(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    pub fn stmt_list(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        &self.stmt_lists[start..start + range.len()]
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

/// One fully type-checked Input-Language file: the unit of translation.
#[derive(Clone, Debug)]
pub struct SourceUnit {
    /// File name used in diagnostics.
    pub name: Name,
    pub arena: SourceArena,
    pub types: Vec<TypeDecl>,
    /// Top-level statements, lowered after the type declarations.
    pub statements: StmtRange,
}

impl SourceUnit {
    pub fn new(name: Name, arena: SourceArena) -> Self {
        SourceUnit {
            name,
            arena,
            types: Vec::new(),
            statements: StmtRange::EMPTY,
        }
    }
}
