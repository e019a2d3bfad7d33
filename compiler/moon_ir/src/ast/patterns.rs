//! Pattern nodes of the Input-Language tree.

use super::operators::RelationalOp;
use crate::{ExprId, Name, PatternId, Span, SymbolId, TypeId};

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

/// The `..` element of a list pattern.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SlicePattern {
    /// `..rest` / `.. var rest`; `None` for a bare `..`.
    pub binding: Option<Name>,
}

/// `Name: pattern` inside a property pattern.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct PropertySubpattern {
    pub name: Name,
    pub symbol: SymbolId,
    pub pattern: PatternId,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum PatternKind {
    /// `_`
    Discard,
    /// A constant expression (`null`, literals, enum members, constants).
    Constant(ExprId),
    /// `var x` (`ty` = None) or `T x`.
    Declaration { name: Name, ty: Option<TypeId> },
    /// `T`
    Type(TypeId),
    /// `< 5`, `>= limit`
    Relational { op: RelationalOp, value: ExprId },
    Not(PatternId),
    And(PatternId, PatternId),
    Or(PatternId, PatternId),
    /// `[head.., ..rest, tail..]`
    List {
        head: Vec<PatternId>,
        slice: Option<SlicePattern>,
        tail: Vec<PatternId>,
        /// `[..] list` designation.
        binding: Option<Name>,
    },
    /// Positional `(a, b)`.
    Tuple(Vec<PatternId>),
    /// `T { A: p, B: q } name`
    Property {
        ty: Option<TypeId>,
        fields: Vec<PropertySubpattern>,
        binding: Option<Name>,
    },
}
