//! Semantic model supplied by the front end.
//!
//! The lowering trusts these bindings completely: overloads, generic
//! arguments and nullability are already resolved, and the core only asks
//! "what is the type of this node" and "what does this name refer to".

mod symbols;
mod types;

pub use symbols::{
    MethodSymbol, Symbol, SymbolId, SymbolKind, SymbolTable, TypeDeclKind, TypeSymbol,
    WellKnownMember, WellKnownType,
};
pub use types::{Primitive, TupleElement, TypeId, TypeKind, TypePool};

use crate::Name;

/// Types and symbols of one compilation, shared by all of its units.
#[derive(Clone, Debug, Default)]
pub struct SemanticModel {
    pub types: TypePool,
    pub symbols: SymbolTable,
}

impl SemanticModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_some() {
            self.symbols.get(id)
        } else {
            None
        }
    }

    pub fn type_kind(&self, id: TypeId) -> &TypeKind {
        self.types.kind(id)
    }

    /// The type symbol behind a named type, looking through `Nullable`.
    pub fn type_symbol_of(&self, ty: TypeId) -> Option<(SymbolId, &TypeSymbol)> {
        match self.types.kind(self.types.non_nullable(ty)) {
            TypeKind::Named { symbol, .. } => {
                let sym = self.symbol(*symbol)?;
                sym.as_type().map(|t| (*symbol, t))
            }
            _ => None,
        }
    }

    /// The well-known identity of a named type, if any.
    pub fn well_known(&self, ty: TypeId) -> Option<WellKnownType> {
        self.type_symbol_of(ty).and_then(|(_, t)| t.well_known)
    }

    /// Declare a source type, returning its symbol and its (unconstructed) type.
    pub fn declare_type(
        &mut self,
        name: Name,
        decl_kind: TypeDeclKind,
        containing: Option<SymbolId>,
    ) -> (SymbolId, TypeId) {
        let symbol = self.symbols.add(Symbol {
            name,
            kind: SymbolKind::Type(TypeSymbol {
                decl_kind,
                containing,
                type_params: Vec::new(),
                well_known: None,
                is_static: false,
            }),
            owner: containing,
        });
        (symbol, self.types.named(symbol, Vec::new()))
    }

    /// Declare a library type the lowering recognises by identity.
    pub fn declare_library_type(
        &mut self,
        name: Name,
        well_known: WellKnownType,
        type_params: Vec<Name>,
    ) -> SymbolId {
        let decl_kind = match well_known {
            WellKnownType::Action | WellKnownType::Func => TypeDeclKind::Delegate,
            WellKnownType::KeyValuePair => TypeDeclKind::Struct,
            WellKnownType::IEnumerable
            | WellKnownType::ICollection
            | WellKnownType::IList
            | WellKnownType::IReadOnlyList
            | WellKnownType::IDictionary
            | WellKnownType::IDisposable => TypeDeclKind::Interface,
            _ => TypeDeclKind::Class,
        };
        self.symbols.add(Symbol {
            name,
            kind: SymbolKind::Type(TypeSymbol {
                decl_kind,
                containing: None,
                type_params,
                well_known: Some(well_known),
                is_static: matches!(
                    well_known,
                    WellKnownType::Math | WellKnownType::Console | WellKnownType::Enumerable
                ),
            }),
            owner: None,
        })
    }

    pub fn declare_member(&mut self, owner: SymbolId, name: Name, kind: SymbolKind) -> SymbolId {
        self.symbols.add(Symbol {
            name,
            kind,
            owner: Some(owner),
        })
    }

    pub fn declare_method(&mut self, owner: SymbolId, name: Name, method: MethodSymbol) -> SymbolId {
        self.declare_member(owner, name, SymbolKind::Method(method))
    }

    /// `symbol<args>`
    pub fn constructed(&mut self, symbol: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.types.named(symbol, args)
    }

    /// Generic arguments of a constructed named type.
    pub fn type_args(&self, ty: TypeId) -> &[TypeId] {
        match self.types.kind(self.types.non_nullable(ty)) {
            TypeKind::Named { args, .. } => args,
            _ => &[],
        }
    }
}
