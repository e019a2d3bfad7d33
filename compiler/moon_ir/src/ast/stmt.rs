//! Statement nodes of the Input-Language tree.

use std::fmt;

use super::items::MethodDecl;
use crate::{ExprId, ExprRange, Name, PatternId, Span, StmtId, StmtRange, TypeId};

#[derive(Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl fmt::Debug for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// `T name = init` inside a local declaration.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LocalDecl {
    pub name: Name,
    pub ty: TypeId,
    /// `ExprId::INVALID` = no initializer.
    pub init: ExprId,
}

/// Iteration variable(s) of a `foreach`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum ForEachBinding {
    Single { name: Name, ty: TypeId },
    /// `foreach (var (k, v) in source)`
    Deconstruct(Vec<Name>),
}

/// `case pattern when guard:` or `default:`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum SwitchLabel {
    Case {
        pattern: PatternId,
        /// `ExprId::INVALID` = no guard.
        guard: ExprId,
    },
    Default,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SwitchSection {
    pub labels: Vec<SwitchLabel>,
    pub body: StmtRange,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CatchClause {
    /// Caught exception type; `TypeId::ERROR` for a bare `catch`.
    pub ty: TypeId,
    pub name: Option<Name>,
    pub body: StmtId,
    pub span: Span,
}

/// Resource of a `using` statement.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum UsingResource {
    Decl(LocalDecl),
    Expr(ExprId),
}

#[derive(Clone, PartialEq, Debug)]
pub enum StmtKind {
    Expr(ExprId),
    Local(Vec<LocalDecl>),
    /// `var (a, b) = init;`
    Deconstruct {
        names: Vec<Name>,
        init: ExprId,
    },
    Block(StmtRange),
    If {
        cond: ExprId,
        then_branch: StmtId,
        /// `StmtId::INVALID` = no else.
        else_branch: StmtId,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        cond: ExprId,
    },
    For {
        init: StmtRange,
        /// `ExprId::INVALID` = loop forever.
        cond: ExprId,
        step: ExprRange,
        body: StmtId,
    },
    ForEach {
        binding: ForEachBinding,
        source: ExprId,
        body: StmtId,
    },
    Switch {
        subject: ExprId,
        sections: Vec<SwitchSection>,
    },
    Try {
        body: StmtId,
        catches: Vec<CatchClause>,
        /// `StmtId::INVALID` = no finally.
        finally: StmtId,
    },
    /// `using (resource) body`
    Using {
        resource: UsingResource,
        body: StmtId,
    },
    /// `using var x = ...;` scoped to the rest of the enclosing block.
    UsingDecl(LocalDecl),
    /// `ExprId::INVALID` = bare `return`.
    Return(ExprId),
    Break,
    Continue,
    YieldReturn(ExprId),
    YieldBreak,
    /// `ExprId::INVALID` = rethrow.
    Throw(ExprId),
    LocalFunction(Box<MethodDecl>),
    Empty,
}
