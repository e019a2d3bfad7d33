//! Luau statements and expressions.
//!
//! Unlike the source tree this AST owns its children. Lowering builds it
//! bottom-up and freely clones subtrees (a subject expression reused in several
//! conditions, a type annotation stamped onto many parameters); ownership
//! guarantees those copies never alias.

use super::TypeInfo;
use crate::Name;

/// Sequence of statements. Renders without delimiters; wrap in
/// [`Stmt::Do`] for a scoped block.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }

    pub fn empty() -> Self {
        Block { stmts: Vec::new() }
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn extend(&mut self, stmts: impl IntoIterator<Item = Stmt>) {
        self.stmts.extend(stmts);
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Whether control can fall off the end of this block.
    pub fn falls_through(&self) -> bool {
        !matches!(
            self.stmts.last(),
            Some(Stmt::Return(_) | Stmt::Break | Stmt::Continue)
        )
    }
}

impl From<Vec<Stmt>> for Block {
    fn from(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }
}

/// `name: T` in a local binding or parameter list.
#[derive(Clone, PartialEq, Debug)]
pub struct Binding {
    pub name: Name,
    pub ty: Option<TypeInfo>,
}

impl Binding {
    pub fn new(name: Name) -> Self {
        Binding { name, ty: None }
    }

    pub fn typed(name: Name, ty: TypeInfo) -> Self {
        Binding { name, ty: Some(ty) }
    }
}

/// Function literal or declaration body.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Function {
    pub type_params: Vec<Name>,
    pub params: Vec<Binding>,
    /// `...: T` tail; `Some(None)` for an unannotated `...`.
    pub variadic: Option<Option<TypeInfo>>,
    pub ret: Option<TypeInfo>,
    pub body: Block,
}

/// Target of a `function a.b.c` / `function a:m` declaration.
#[derive(Clone, PartialEq, Debug)]
pub struct FunctionName {
    pub path: Vec<Name>,
    /// `a:m` form (implicit `self`).
    pub method: Option<Name>,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Stmt {
    /// `local a: T, b = x, y`
    Local {
        bindings: Vec<Binding>,
        values: Vec<Expr>,
    },
    /// `a, b = x, y`
    Assign {
        targets: Vec<Expr>,
        values: Vec<Expr>,
    },
    /// `a += x`
    CompoundAssign {
        op: CompoundOp,
        target: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then_block: Block,
        else_ifs: Vec<(Expr, Block)>,
        else_block: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    Repeat {
        body: Block,
        until: Expr,
    },
    NumericFor {
        var: Name,
        start: Expr,
        end: Expr,
        step: Option<Expr>,
        body: Block,
    },
    GenericFor {
        vars: Vec<Name>,
        iter: Vec<Expr>,
        body: Block,
    },
    Return(Vec<Expr>),
    Break,
    Continue,
    /// `function a.b(..)` / `function a:b(..)`
    FunctionDecl {
        name: FunctionName,
        func: Function,
    },
    /// `local function f(..)`
    LocalFunction {
        name: Name,
        func: Function,
    },
    /// `do .. end`
    Do(Block),
    Expr(Expr),
    /// `type Name<T> = ..` / `export type ..`
    TypeAlias {
        name: Name,
        type_params: Vec<Name>,
        ty: TypeInfo,
        exported: bool,
    },
    /// Inlined sequence; flattens into the surrounding block when rendered.
    Seq(Vec<Stmt>),
}

impl Stmt {
    pub fn local(name: Name, value: Expr) -> Self {
        Stmt::Local {
            bindings: vec![Binding::new(name)],
            values: vec![value],
        }
    }

    pub fn local_uninit(names: Vec<Name>) -> Self {
        Stmt::Local {
            bindings: names.into_iter().map(Binding::new).collect(),
            values: Vec::new(),
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::Assign {
            targets: vec![target],
            values: vec![value],
        }
    }

    pub fn if_then(cond: Expr, then_block: Block) -> Self {
        Stmt::If {
            cond,
            then_block,
            else_ifs: Vec::new(),
            else_block: None,
        }
    }

    pub fn ret(value: Expr) -> Self {
        Stmt::Return(vec![value])
    }
}

/// Compound assignment operators Luau supports natively.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CompoundOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Concat,
}

impl CompoundOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompoundOp::Add => "+=",
            CompoundOp::Sub => "-=",
            CompoundOp::Mul => "*=",
            CompoundOp::Div => "/=",
            CompoundOp::FloorDiv => "//=",
            CompoundOp::Mod => "%=",
            CompoundOp::Pow => "^=",
            CompoundOp::Concat => "..=",
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
    Concat,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::FloorDiv => "//",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Concat => "..",
            BinOp::Eq => "==",
            BinOp::NotEq => "~=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    /// Luau binding power; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 3,
            BinOp::Concat => 4,
            BinOp::Add | BinOp::Sub => 5,
            BinOp::Mul | BinOp::Div | BinOp::FloorDiv | BinOp::Mod => 6,
            BinOp::Pow => 8,
        }
    }

    pub fn is_right_assoc(self) -> bool {
        matches!(self, BinOp::Concat | BinOp::Pow)
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnOp {
    Neg,
    Not,
    /// `#`
    Len,
}

impl UnOp {
    pub const PRECEDENCE: u8 = 7;

    pub fn as_str(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "not ",
            UnOp::Len => "#",
        }
    }
}

/// Entry of a table constructor.
#[derive(Clone, PartialEq, Debug)]
pub enum TableField {
    /// `value`
    Positional(Expr),
    /// `name = value`
    Named(Name, Expr),
    /// `[key] = value`
    Keyed(Expr, Expr),
}

/// Segment of an interpolated string.
#[derive(Clone, PartialEq, Debug)]
pub enum InterpPart {
    Text(String),
    Expr(Expr),
}

#[derive(Clone, PartialEq, Debug)]
pub enum Expr {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    /// `...`
    Vararg,
    Ident(Name),
    /// `object.name`
    Member {
        object: Box<Expr>,
        name: Name,
    },
    /// `object[key]`
    Index {
        object: Box<Expr>,
        key: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `receiver:method(args)`
    MethodCall {
        receiver: Box<Expr>,
        method: Name,
        args: Vec<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Table(Vec<TableField>),
    Function(Box<Function>),
    /// `expr :: T`
    Cast {
        expr: Box<Expr>,
        ty: Box<TypeInfo>,
    },
    Interpolated(Vec<InterpPart>),
    /// `if c then a else b`
    IfElse {
        cond: Box<Expr>,
        then_value: Box<Expr>,
        else_value: Box<Expr>,
    },
    Paren(Box<Expr>),
    /// `typeof(expr)`
    TypeOf(Box<Expr>),
}

impl Expr {
    pub fn ident(name: Name) -> Self {
        Expr::Ident(name)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::String(text.into())
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn int(value: i64) -> Self {
        Expr::Number(value as f64)
    }

    #[must_use]
    pub fn member(self, name: Name) -> Self {
        Expr::Member {
            object: Box::new(self),
            name,
        }
    }

    #[must_use]
    pub fn index(self, key: Expr) -> Self {
        Expr::Index {
            object: Box::new(self),
            key: Box::new(key),
        }
    }

    #[must_use]
    pub fn call(self, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(self),
            args,
        }
    }

    #[must_use]
    pub fn method_call(self, method: Name, args: Vec<Expr>) -> Self {
        Expr::MethodCall {
            receiver: Box::new(self),
            method,
            args,
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn if_else(cond: Expr, then_value: Expr, else_value: Expr) -> Self {
        Expr::IfElse {
            cond: Box::new(cond),
            then_value: Box::new(then_value),
            else_value: Box::new(else_value),
        }
    }

    pub fn function(func: Function) -> Self {
        Expr::Function(Box::new(func))
    }

    /// Logical negation, folding `not not x` and literal booleans.
    #[must_use]
    pub fn not(self) -> Self {
        match self {
            Expr::Bool(b) => Expr::Bool(!b),
            Expr::Unary {
                op: UnOp::Not,
                operand,
            } => *operand,
            Expr::Binary {
                op: BinOp::Eq,
                lhs,
                rhs,
            } => Expr::Binary {
                op: BinOp::NotEq,
                lhs,
                rhs,
            },
            Expr::Binary {
                op: BinOp::NotEq,
                lhs,
                rhs,
            } => Expr::Binary {
                op: BinOp::Eq,
                lhs,
                rhs,
            },
            other => Expr::unary(UnOp::Not, other),
        }
    }

    /// Literals and plain names: safe to duplicate and to evaluate late.
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            Expr::Nil | Expr::Bool(_) | Expr::Number(_) | Expr::String(_) | Expr::Ident(_)
        )
    }

    /// Values no statement can change.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Nil | Expr::Bool(_) | Expr::Number(_) | Expr::String(_) => true,
            Expr::Unary {
                op: UnOp::Neg,
                operand,
            } => operand.is_constant(),
            Expr::Function(_) => true,
            _ => false,
        }
    }

    /// Whether this is a valid assignment target.
    pub fn is_place(&self) -> bool {
        matches!(self, Expr::Ident(_) | Expr::Member { .. } | Expr::Index { .. })
    }

    /// Whether this may stand alone as a statement (calls only).
    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call { .. } | Expr::MethodCall { .. })
    }
}
