//! Declarations: types, members, parameters and attributes.

use crate::sema::TypeDeclKind;
use crate::{ExprId, ExprRange, Name, Span, StmtId, SymbolId, TypeId};

/// `[Name(positional, Key = named)]`
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct AttributeUse {
    pub name: Name,
    pub args: ExprRange,
    pub named_args: Vec<(Name, ExprId)>,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: TypeId,
    /// `ExprId::INVALID` = no default value.
    pub default: ExprId,
    /// Trailing `params T[] name`.
    pub is_params: bool,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MethodBody {
    Block(StmtId),
    /// `=> expr`
    Expr(ExprId),
    /// Abstract / interface member.
    None,
}

/// `: base(args)` / `: this(args)`
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CtorInitializer {
    Base(ExprRange),
    This(ExprRange),
}

#[derive(Clone, PartialEq, Debug)]
pub struct MethodDecl {
    pub symbol: SymbolId,
    pub name: Name,
    pub type_params: Vec<Name>,
    pub params: Vec<Param>,
    pub ret: TypeId,
    pub body: MethodBody,
    pub is_static: bool,
    pub is_async: bool,
    pub attributes: Vec<AttributeUse>,
    pub ctor_initializer: Option<CtorInitializer>,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldDecl {
    pub symbol: SymbolId,
    pub name: Name,
    pub ty: TypeId,
    /// `ExprId::INVALID` = default value of the type.
    pub init: ExprId,
    pub is_static: bool,
    pub is_const: bool,
    pub span: Span,
}

#[derive(Clone, PartialEq, Debug)]
pub struct PropertyDecl {
    pub symbol: SymbolId,
    pub name: Name,
    pub ty: TypeId,
    pub is_static: bool,
    /// Getter body; `None` for auto-properties.
    pub getter: Option<MethodBody>,
    /// Setter body (`value` is the implicit parameter).
    pub setter: Option<MethodBody>,
    pub has_setter: bool,
    /// Auto-property initializer; `ExprId::INVALID` = none.
    pub init: ExprId,
    pub span: Span,
}

impl PropertyDecl {
    pub fn is_auto(&self) -> bool {
        self.getter.is_none() && self.setter.is_none()
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct EventDecl {
    pub symbol: SymbolId,
    pub name: Name,
    pub ty: TypeId,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct EnumMemberDecl {
    pub symbol: SymbolId,
    pub name: Name,
    pub value: i64,
}

#[derive(Clone, PartialEq, Debug)]
pub enum Member {
    Field(FieldDecl),
    Property(PropertyDecl),
    Method(MethodDecl),
    Constructor(MethodDecl),
    /// `static T() { .. }`
    StaticConstructor(StmtId),
    Event(EventDecl),
    EnumMember(EnumMemberDecl),
}

#[derive(Clone, PartialEq, Debug)]
pub struct TypeDecl {
    pub symbol: SymbolId,
    pub name: Name,
    pub kind: TypeDeclKind,
    pub is_static: bool,
    pub type_params: Vec<Name>,
    pub attributes: Vec<AttributeUse>,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub members: Vec<Member>,
    pub nested: Vec<TypeDecl>,
    pub span: Span,
}

impl TypeDecl {
    pub fn methods(&self) -> impl Iterator<Item = &MethodDecl> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(method) => Some(method),
            _ => None,
        })
    }

    pub fn static_constructor(&self) -> Option<StmtId> {
        self.members.iter().find_map(|m| match m {
            Member::StaticConstructor(body) => Some(*body),
            _ => None,
        })
    }
}
