//! Resolved Input-Language types.

use std::fmt;

use crate::{Name, SymbolId};

/// Index into the [`TypePool`].
///
/// The first few indices are reserved for primitives so that callers (and
/// tests) can name them without a pool lookup.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct TypeId(u32);

impl TypeId {
    pub const VOID: TypeId = TypeId(0);
    pub const BOOL: TypeId = TypeId(1);
    pub const INT: TypeId = TypeId(2);
    pub const LONG: TypeId = TypeId(3);
    pub const FLOAT: TypeId = TypeId(4);
    pub const DOUBLE: TypeId = TypeId(5);
    pub const CHAR: TypeId = TypeId(6);
    pub const STRING: TypeId = TypeId(7);
    pub const OBJECT: TypeId = TypeId(8);
    pub const BYTE: TypeId = TypeId(9);
    pub const UINT: TypeId = TypeId(10);
    pub const DECIMAL: TypeId = TypeId(11);
    pub const DYNAMIC: TypeId = TypeId(12);
    /// The type of the `null` literal before conversion.
    pub const NULL: TypeId = TypeId(13);
    /// Unresolved; the front end already reported it.
    pub const ERROR: TypeId = TypeId(14);

    const FIRST_DYNAMIC: u32 = 15;

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Built-in scalar types.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Primitive {
    Void,
    Bool,
    Byte,
    Int,
    UInt,
    Long,
    Float,
    Double,
    Decimal,
    Char,
    String,
    Object,
    Dynamic,
    Null,
}

impl Primitive {
    /// Integral types use truncating division and bitwise semantics.
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Primitive::Byte | Primitive::Int | Primitive::UInt | Primitive::Long | Primitive::Char
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral()
            || matches!(self, Primitive::Float | Primitive::Double | Primitive::Decimal)
    }
}

/// Resolved type shapes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeKind {
    Primitive(Primitive),
    /// `T?`
    Nullable(TypeId),
    /// `T[]`
    Array(TypeId),
    /// `(A, B)` with optional element names.
    Tuple(Vec<TupleElement>),
    /// A class/struct/interface/enum/delegate, possibly constructed.
    Named { symbol: SymbolId, args: Vec<TypeId> },
    /// A generic parameter with its constraint clauses.
    TypeParam { name: Name, constraints: Vec<TypeId> },
    /// Anonymous function type (lambdas before conversion).
    Function { params: Vec<TypeId>, ret: TypeId },
    Error,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TupleElement {
    pub name: Option<Name>,
    pub ty: TypeId,
}

/// Interned storage for all types of a compilation.
#[derive(Clone, Debug)]
pub struct TypePool {
    kinds: Vec<TypeKind>,
}

impl TypePool {
    pub fn new() -> Self {
        let primitives = [
            Primitive::Void,
            Primitive::Bool,
            Primitive::Int,
            Primitive::Long,
            Primitive::Float,
            Primitive::Double,
            Primitive::Char,
            Primitive::String,
            Primitive::Object,
            Primitive::Byte,
            Primitive::UInt,
            Primitive::Decimal,
            Primitive::Dynamic,
            Primitive::Null,
        ];
        let mut kinds: Vec<TypeKind> = primitives.into_iter().map(TypeKind::Primitive).collect();
        kinds.push(TypeKind::Error);
        debug_assert_eq!(kinds.len(), TypeId::FIRST_DYNAMIC as usize);
        TypePool { kinds }
    }

    /// Add a type, reusing an existing identical entry.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(pos) = self.kinds.iter().position(|k| *k == kind) {
            return TypeId(pos as u32);
        }
        let id = TypeId(u32::try_from(self.kinds.len()).unwrap_or(u32::MAX));
        self.kinds.push(kind);
        id
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        self.kinds.get(id.index()).unwrap_or(&TypeKind::Error)
    }

    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        self.intern(TypeKind::Nullable(inner))
    }

    pub fn array(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeKind::Array(elem))
    }

    pub fn named(&mut self, symbol: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Named { symbol, args })
    }

    pub fn tuple(&mut self, elems: &[TypeId]) -> TypeId {
        let elems = elems
            .iter()
            .map(|&ty| TupleElement { name: None, ty })
            .collect();
        self.intern(TypeKind::Tuple(elems))
    }

    /// Strip one level of `Nullable`.
    pub fn non_nullable(&self, id: TypeId) -> TypeId {
        match self.kind(id) {
            TypeKind::Nullable(inner) => *inner,
            _ => id,
        }
    }

    pub fn primitive(&self, id: TypeId) -> Option<Primitive> {
        match self.kind(self.non_nullable(id)) {
            TypeKind::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_string(&self, id: TypeId) -> bool {
        matches!(self.primitive(id), Some(Primitive::String | Primitive::Char))
    }

    pub fn is_integral(&self, id: TypeId) -> bool {
        self.primitive(id).is_some_and(Primitive::is_integral)
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        self.primitive(id).is_some_and(Primitive::is_numeric)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for TypePool {
    fn default() -> Self {
        Self::new()
    }
}
