//! Luau type annotations.
//!
//! `TypeInfo` mirrors the expression tree: every node owns its children, so
//! `clone()` is a deep copy. Template shapes (the `...: T?` tail of a `params`
//! parameter, a field type reused in an interface alias) are cloned at each
//! use site and never shared.

use super::Expr;
use crate::Name;

/// Access qualifier on an interface field.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum FieldAccess {
    #[default]
    ReadWrite,
    /// `read name: T`
    Read,
    /// `write name: T`
    Write,
}

#[derive(Clone, PartialEq, Debug)]
pub struct FieldType {
    pub name: Name,
    pub ty: TypeInfo,
    pub access: FieldAccess,
}

#[derive(Clone, PartialEq, Debug)]
pub enum TypeInfo {
    /// `number`, `string`, `Foo`
    Basic(Name),
    /// `T?`
    Optional(Box<TypeInfo>),
    /// `(A, B, ...C)`
    Tuple {
        elements: Vec<TypeInfo>,
        variadic: Option<Box<TypeInfo>>,
    },
    /// `...T`
    Variadic(Box<TypeInfo>),
    /// `{ T }`
    Array(Box<TypeInfo>),
    /// `{ [K]: V }`
    Mapped {
        key: Box<TypeInfo>,
        value: Box<TypeInfo>,
    },
    /// `(A, B) -> R`
    Function {
        params: Vec<TypeInfo>,
        ret: Box<TypeInfo>,
    },
    /// `{ a: A, read b: B }`
    Interface(Vec<FieldType>),
    /// `Name<A, B>`; constraint clauses are kept for tooling but not printed,
    /// Luau has no syntax for them.
    GenericName {
        name: Name,
        args: Vec<TypeInfo>,
        constraints: Vec<TypeInfo>,
    },
    /// `typeof(expr)`
    TypeOf(Box<Expr>),
    /// `keyof<T>`
    KeyOf(Box<TypeInfo>),
    /// `index<T, K>`
    IndexOf {
        target: Box<TypeInfo>,
        key: Box<TypeInfo>,
    },
}

impl TypeInfo {
    pub fn optional(inner: TypeInfo) -> Self {
        match inner {
            already @ TypeInfo::Optional(_) => already,
            other => TypeInfo::Optional(Box::new(other)),
        }
    }

    pub fn array(elem: TypeInfo) -> Self {
        TypeInfo::Array(Box::new(elem))
    }

    pub fn mapped(key: TypeInfo, value: TypeInfo) -> Self {
        TypeInfo::Mapped {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn variadic(inner: TypeInfo) -> Self {
        TypeInfo::Variadic(Box::new(inner))
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeInfo::Optional(_))
    }
}
