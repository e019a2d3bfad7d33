//! Resolved Input-Language symbols.

use std::fmt;

use crate::{Name, TypeId};

/// Index into the [`SymbolTable`].
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    /// "No symbol": plain locals, parameters and synthesized names.
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_some() {
            write!(f, "SymbolId({})", self.0)
        } else {
            write!(f, "SymbolId::NONE")
        }
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        Self::NONE
    }
}

/// Declaration shape of a type symbol.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeDeclKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    Delegate,
}

/// Library types the lowering recognises by identity rather than by name.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WellKnownType {
    List,
    HashSet,
    Dictionary,
    IEnumerable,
    ICollection,
    IList,
    IReadOnlyList,
    IDictionary,
    KeyValuePair,
    Action,
    Func,
    Task,
    Exception,
    IDisposable,
    Enumerable,
    Math,
    Console,
    String,
}

/// Library methods/members with dedicated lowerings.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum WellKnownMember {
    /// `Enumerable.Range(start, count)`
    EnumerableRange,
    ListAdd,
    ListRemoveAt,
    ListClear,
    ListContains,
    ListInsert,
    /// `Count` on lists/collections and `Length` on arrays.
    CollectionCount,
    DictionaryContainsKey,
    DictionaryRemove,
    SetAdd,
    SetContains,
    SetRemove,
    StringLength,
    StringToUpper,
    StringToLower,
    StringSubstring,
    StringTrim,
    StringFormat,
    StringIsNullOrEmpty,
    ToString,
    ConsoleWriteLine,
    MathAbs,
    MathFloor,
    MathCeiling,
    MathMax,
    MathMin,
    MathSqrt,
    MathPow,
    /// `ToArray()` / `ToList()` on an enumerable.
    EnumerableCollect,
    /// `Invoke` on a delegate or event.
    Invoke,
    Dispose,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeSymbol {
    pub decl_kind: TypeDeclKind,
    /// Enclosing type for nested declarations.
    pub containing: Option<SymbolId>,
    pub type_params: Vec<Name>,
    pub well_known: Option<WellKnownType>,
    pub is_static: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MethodSymbol {
    pub is_static: bool,
    /// Static helper whose first parameter is the receiver (`this T x`).
    pub is_extension: bool,
    pub is_async: bool,
    pub is_constructor: bool,
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub well_known: Option<WellKnownMember>,
}

impl MethodSymbol {
    /// A plain instance method returning `ret`.
    pub fn returning(ret: TypeId) -> Self {
        MethodSymbol {
            is_static: false,
            is_extension: false,
            is_async: false,
            is_constructor: false,
            params: Vec::new(),
            ret,
            well_known: None,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Vec<TypeId>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn with_well_known(mut self, member: WellKnownMember) -> Self {
        self.well_known = Some(member);
        self
    }
}

/// What a symbol denotes.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum SymbolKind {
    Type(TypeSymbol),
    Method(MethodSymbol),
    Field {
        is_static: bool,
        is_const: bool,
        ty: TypeId,
    },
    Property {
        is_static: bool,
        /// Auto-properties are stored like fields.
        is_auto: bool,
        ty: TypeId,
        well_known: Option<WellKnownMember>,
    },
    Event {
        is_static: bool,
        ty: TypeId,
    },
    EnumMember {
        value: i64,
    },
    Local,
    Parameter,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Symbol {
    pub name: Name,
    pub kind: SymbolKind,
    /// Declaring type of a member.
    pub owner: Option<SymbolId>,
}

impl Symbol {
    /// Whether member access needs no instance receiver.
    pub fn is_static_member(&self) -> bool {
        match &self.kind {
            SymbolKind::Method(m) => m.is_static,
            SymbolKind::Field { is_static, is_const, .. } => *is_static || *is_const,
            SymbolKind::Property { is_static, .. } | SymbolKind::Event { is_static, .. } => {
                *is_static
            }
            SymbolKind::EnumMember { .. } | SymbolKind::Type(_) => true,
            SymbolKind::Local | SymbolKind::Parameter => false,
        }
    }

    pub fn as_method(&self) -> Option<&MethodSymbol> {
        match &self.kind {
            SymbolKind::Method(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeSymbol> {
        match &self.kind {
            SymbolKind::Type(t) => Some(t),
            _ => None,
        }
    }
}

/// Every symbol of a compilation.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX - 1));
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
