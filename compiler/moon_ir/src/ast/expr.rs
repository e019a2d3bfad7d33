//! Expression nodes of the Input-Language tree.

use std::fmt;

use super::operators::{BinaryOp, IncDecOp, UnaryOp};
use crate::{ExprId, ExprRange, Name, PatternId, Span, StmtId, SymbolId, TypeId};

/// Expression node with its resolved type.
#[derive(Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    /// Type assigned by the front end (after implicit conversions).
    pub ty: TypeId,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span, ty: TypeId) -> Self {
        Expr { kind, span, ty }
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {:?} @ {:?}", self.kind, self.ty, self.span)
    }
}

/// One segment of an interpolated string.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum InterpolationPart {
    Text(Name),
    Expr(ExprId),
}

/// `Name = value` inside an object initializer.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MemberInit {
    pub name: Name,
    pub symbol: SymbolId,
    pub value: ExprId,
}

/// Collection initializer contents of a `new` expression.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Initializer {
    /// `new Foo { A = 1, B = 2 }`
    Object(Vec<MemberInit>),
    /// `new List<int> { 1, 2 }`
    Collection(ExprRange),
    /// `new Dictionary<K, V> { [k] = v }` / `{ { k, v } }`
    Dictionary(Vec<(ExprId, ExprId)>),
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct LambdaParam {
    pub name: Name,
    pub ty: TypeId,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum LambdaBody {
    Expr(ExprId),
    Block(StmtId),
}

/// One arm of a switch expression: `pattern when guard => value`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct SwitchExprArm {
    pub pattern: PatternId,
    /// `ExprId::INVALID` = no guard.
    pub guard: ExprId,
    pub value: ExprId,
    pub span: Span,
}

/// Expression variants.
#[derive(Clone, PartialEq, Debug)]
pub enum ExprKind {
    Null,
    Bool(bool),
    Int(i64),
    /// Float literal; the source spelling is kept so fractional steps survive.
    Float(f64),
    Char(char),
    String(Name),
    /// `default` / `default(T)`; the value follows from the node type.
    Default,

    /// A simple name: local, parameter, or implicitly-qualified member.
    Ident {
        name: Name,
        symbol: SymbolId,
    },
    This,
    Base,
    /// A type used as the receiver of a static member access.
    TypeRef(SymbolId),

    /// `receiver.name`
    Member {
        receiver: ExprId,
        name: Name,
        symbol: SymbolId,
    },
    /// `receiver[index]`
    Element {
        receiver: ExprId,
        index: ExprId,
    },
    /// `receiver?.access`; `access` is rooted at a [`ExprKind::ConditionalReceiver`].
    ConditionalAccess {
        receiver: ExprId,
        access: ExprId,
    },
    /// The value being accessed inside a `?.` chain.
    ConditionalReceiver,

    /// `callee(args)`; `method` is the resolved target (NONE for delegates).
    Invocation {
        callee: ExprId,
        args: ExprRange,
        method: SymbolId,
    },
    /// `new T(args) { initializer }`
    New {
        args: ExprRange,
        ctor: SymbolId,
        initializer: Option<Initializer>,
    },
    /// `new T[size]`
    ArrayCreation {
        size: ExprId,
    },
    /// Collection expression / array initializer: `[1, 2, 3]`.
    Collection(ExprRange),
    /// `(a, b)`
    Tuple(ExprRange),

    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    IncDec {
        op: IncDecOp,
        target: ExprId,
    },
    /// `target = value`, usable as a value.
    Assign {
        target: ExprId,
        value: ExprId,
    },
    /// `target op= value`; `Coalesce` is `??=`.
    CompoundAssign {
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
    },
    /// `cond ? a : b`
    Conditional {
        cond: ExprId,
        then_value: ExprId,
        else_value: ExprId,
    },

    Lambda {
        params: Vec<LambdaParam>,
        body: LambdaBody,
        is_async: bool,
    },
    Interpolated(Vec<InterpolationPart>),
    /// `(T)expr`
    Cast {
        expr: ExprId,
        target: TypeId,
    },
    /// `expr as T`
    As {
        expr: ExprId,
        target: TypeId,
    },
    /// `typeof(T)`
    TypeOf(TypeId),
    /// `nameof(x)`, already resolved to its text.
    NameOf(Name),
    /// `expr is pattern`
    Is {
        expr: ExprId,
        pattern: PatternId,
    },
    /// `subject switch { arms }`
    Switch {
        subject: ExprId,
        arms: Vec<SwitchExprArm>,
    },
    Await(ExprId),
    /// Inclusive numeric range `start..end` with optional step
    /// (`ExprId::INVALID` = step 1).
    Range {
        start: ExprId,
        end: ExprId,
        step: ExprId,
    },
}
