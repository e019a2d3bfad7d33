//! Shared fixtures for the lowering unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use moon_diagnostic::LowerResult;
use moon_ir::sema::{MethodSymbol, SymbolKind, TypeDeclKind, TypeKind, WellKnownType};
use moon_ir::luau::Expr;
use moon_ir::{Name, SemanticModel, SharedInterner, SourceArena, SourceUnit, SymbolId, TypeId};
use rustc_hash::FxHashMap;

use crate::context::{CompilationContext, CompileOptions, ScriptType};
use crate::lower::Lowerer;
use crate::lower_unit;
use crate::metadata::MetadataRegistry;

/// Interner and semantic model for one test compilation.
pub(crate) struct Fixture {
    pub interner: SharedInterner,
    pub sema: SemanticModel,
    pub options: CompileOptions,
    libraries: FxHashMap<WellKnownType, SymbolId>,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            interner: SharedInterner::new(),
            sema: SemanticModel::new(),
            options: CompileOptions::default().with_script_type(ScriptType::Script),
            libraries: FxHashMap::default(),
        }
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Declare a top-level source type.
    pub fn declare(&mut self, name: &str, kind: TypeDeclKind) -> (SymbolId, TypeId) {
        let name = self.interner.intern(name);
        self.sema.declare_type(name, kind, None)
    }

    pub fn declare_nested(&mut self, name: &str, kind: TypeDeclKind, outer: SymbolId) -> (SymbolId, TypeId) {
        let name = self.interner.intern(name);
        self.sema.declare_type(name, kind, Some(outer))
    }

    /// `List<elem>` (declaring `List` on first use).
    pub fn list_of(&mut self, elem: TypeId) -> TypeId {
        self.library_of("List", WellKnownType::List, vec![elem])
    }

    pub fn dictionary_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.library_of("Dictionary", WellKnownType::Dictionary, vec![key, value])
    }

    pub fn library_of(&mut self, name: &str, well_known: WellKnownType, args: Vec<TypeId>) -> TypeId {
        let symbol = self.library(name, well_known);
        self.sema.constructed(symbol, args)
    }

    /// The symbol of a well-known library type, declared once.
    pub fn library(&mut self, name: &str, well_known: WellKnownType) -> SymbolId {
        if let Some(&symbol) = self.libraries.get(&well_known) {
            return symbol;
        }
        let name = self.interner.intern(name);
        let symbol = self.sema.declare_library_type(name, well_known, Vec::new());
        self.libraries.insert(well_known, symbol);
        symbol
    }

    pub fn field(&mut self, owner: SymbolId, name: &str, ty: TypeId, is_static: bool) -> SymbolId {
        let name = self.interner.intern(name);
        self.sema.declare_member(
            owner,
            name,
            SymbolKind::Field {
                is_static,
                is_const: false,
                ty,
            },
        )
    }

    pub fn method(&mut self, owner: SymbolId, name: &str, method: MethodSymbol) -> SymbolId {
        let name = self.interner.intern(name);
        self.sema.declare_method(owner, name, method)
    }

    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        self.sema.types.nullable(inner)
    }

    pub fn array(&mut self, elem: TypeId) -> TypeId {
        self.sema.types.array(elem)
    }

    pub fn tuple(&mut self, elems: &[TypeId]) -> TypeId {
        self.sema.types.tuple(elems)
    }

    pub fn type_param(&mut self, name: &str) -> TypeId {
        let name = self.interner.intern(name);
        self.sema.types.intern(TypeKind::TypeParam {
            name,
            constraints: Vec::new(),
        })
    }

    /// A lowerer over `arena`, for tests that drive one component directly.
    pub fn lowerer<'a>(&'a self, arena: &'a SourceArena, registry: &'a MetadataRegistry) -> Lowerer<'a> {
        Lowerer::new(arena, &self.sema, &self.interner, registry, self.options)
    }

    pub fn render_expr(&self, expr: &Expr) -> String {
        moon_fmt::render_expr(expr, &*self.interner)
    }

    /// Collect and lower `unit`, returning the rendered chunk.
    pub fn compile(&self, unit: &SourceUnit) -> LowerResult<String> {
        let mut ctx = CompilationContext::new(self.options, self.interner.clone());
        ctx.registry.collect_unit(unit, &self.sema, &self.interner);
        let chunk = lower_unit(unit, &self.sema, &ctx)?;
        Ok(moon_fmt::render_chunk(&chunk, &*self.interner))
    }

    /// [`Fixture::compile`] without the runtime import line.
    pub fn body(&self, unit: &SourceUnit) -> String {
        let text = self.compile(unit).unwrap();
        match text.split_once("\n\n") {
            Some((_, rest)) => rest.to_string(),
            None => String::new(),
        }
    }
}
