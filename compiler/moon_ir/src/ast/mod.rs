//! Input-Language source tree.
//!
//! Nodes reference their children through arena ids (see [`SourceArena`]).
//! Every expression carries the type the front end resolved for it, and every
//! name reference carries its resolved symbol.
//!
//! [`SourceArena`]: crate::SourceArena

mod expr;
mod items;
mod operators;
mod patterns;
mod stmt;

pub use expr::{
    Expr, ExprKind, Initializer, InterpolationPart, LambdaBody, LambdaParam, MemberInit,
    SwitchExprArm,
};
pub use items::{
    AttributeUse, CtorInitializer, EnumMemberDecl, EventDecl, FieldDecl, Member, MethodBody,
    MethodDecl, Param, PropertyDecl, TypeDecl,
};
pub use operators::{BinaryOp, IncDecOp, RelationalOp, UnaryOp};
pub use patterns::{Pattern, PatternKind, PropertySubpattern, SlicePattern};
pub use stmt::{
    CatchClause, ForEachBinding, LocalDecl, Stmt, StmtKind, SwitchLabel, SwitchSection,
    UsingResource,
};
