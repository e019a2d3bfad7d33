//! Symbol Metadata Registry.
//!
//! Per-type facts that must be known before (or outside) the lowering of the
//! type itself: its mangled name, its generator methods, and the attribute,
//! base and interface lists written into the `__attributes`, `__base` and
//! `__interfaces` fields. A record is created on first reference and
//! accumulates facts until the type's declaration flushes them.
//!
//! The registry belongs to a [`CompilationContext`]; a fresh compilation
//! starts from an empty one.
//!
//! [`CompilationContext`]: crate::CompilationContext

use moon_ir::ast::{AttributeUse, ExprKind, MethodBody, TypeDecl, UnaryOp};
use moon_ir::luau::Expr;
use moon_ir::sema::SymbolKind;
use moon_ir::{
    ExprId, Name, SemanticModel, SourceArena, SourceUnit, StringInterner, SymbolId, TypeId,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::control_flow::generators::contains_yield;

/// `[Name(args, Key = value)]` with its arguments lowered to constants.
#[derive(Clone, PartialEq, Debug)]
pub struct AttributeMeta {
    pub name: Name,
    pub args: Vec<Expr>,
    pub named: Vec<(Name, Expr)>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct SymbolMetadata {
    /// Nested types join their enclosing names with `_`.
    pub mangled_name: Name,
    pub generator_methods: FxHashSet<SymbolId>,
    pub attributes: Vec<AttributeMeta>,
    pub base: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
}

impl SymbolMetadata {
    fn new(mangled_name: Name) -> Self {
        SymbolMetadata {
            mangled_name,
            generator_methods: FxHashSet::default(),
            attributes: Vec::new(),
            base: None,
            interfaces: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct MetadataRegistry {
    entries: FxHashMap<SymbolId, SymbolMetadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, symbol: SymbolId) -> Option<&SymbolMetadata> {
        self.entries.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The record for `symbol`, created on first reference.
    pub fn entry(
        &mut self,
        symbol: SymbolId,
        sema: &SemanticModel,
        interner: &StringInterner,
    ) -> &mut SymbolMetadata {
        self.entries
            .entry(symbol)
            .or_insert_with(|| SymbolMetadata::new(mangle(sema, interner, symbol)))
    }

    /// Emitted name of a type: the recorded one, or computed on the spot for
    /// library types that never get a record.
    pub fn mangled_name(
        &self,
        symbol: SymbolId,
        sema: &SemanticModel,
        interner: &StringInterner,
    ) -> Name {
        match self.entries.get(&symbol) {
            Some(meta) => meta.mangled_name,
            None => mangle(sema, interner, symbol),
        }
    }

    pub fn is_generator(&self, owner: SymbolId, method: SymbolId) -> bool {
        self.entries
            .get(&owner)
            .is_some_and(|meta| meta.generator_methods.contains(&method))
    }

    /// Record every type declared in `unit`, nested ones included.
    ///
    /// Runs for all units before any of them is lowered, so a unit can refer
    /// to types (and generator methods) declared in a later one.
    pub fn collect_unit(
        &mut self,
        unit: &SourceUnit,
        sema: &SemanticModel,
        interner: &StringInterner,
    ) {
        for decl in &unit.types {
            self.collect_type(decl, &unit.arena, sema, interner);
        }
    }

    fn collect_type(
        &mut self,
        decl: &TypeDecl,
        arena: &SourceArena,
        sema: &SemanticModel,
        interner: &StringInterner,
    ) {
        for nested in &decl.nested {
            self.collect_type(nested, arena, sema, interner);
        }

        let attributes: Vec<AttributeMeta> = decl
            .attributes
            .iter()
            .map(|attr| attribute_meta(attr, arena, sema, interner))
            .collect();
        let generators: Vec<SymbolId> = decl
            .methods()
            .filter(|m| matches!(m.body, MethodBody::Block(body) if contains_yield(arena, body)))
            .map(|m| m.symbol)
            .collect();

        let meta = self.entry(decl.symbol, sema, interner);
        for attr in attributes {
            if !meta.attributes.contains(&attr) {
                meta.attributes.push(attr);
            }
        }
        meta.generator_methods.extend(generators);
        if meta.base.is_none() {
            meta.base = decl.base;
        }
        for iface in &decl.interfaces {
            if !meta.interfaces.contains(iface) {
                meta.interfaces.push(*iface);
            }
        }
        tracing::trace!(
            name = interner.lookup(meta.mangled_name),
            generators = meta.generator_methods.len(),
            "collected type metadata"
        );
    }
}

/// `Outer_Inner` for nested types, the plain name otherwise.
pub fn mangle(sema: &SemanticModel, interner: &StringInterner, symbol: SymbolId) -> Name {
    let Some(sym) = sema.symbol(symbol) else {
        return interner.intern("any");
    };
    let containing = sym.as_type().and_then(|t| t.containing);
    match containing {
        None => sym.name,
        Some(outer) => {
            let prefix = mangle(sema, interner, outer);
            let text = format!("{}_{}", interner.lookup(prefix), interner.lookup(sym.name));
            interner.intern_owned(text)
        }
    }
}

fn attribute_meta(
    attr: &AttributeUse,
    arena: &SourceArena,
    sema: &SemanticModel,
    interner: &StringInterner,
) -> AttributeMeta {
    AttributeMeta {
        name: attr.name,
        args: arena
            .expr_list(attr.args)
            .iter()
            .filter_map(|&arg| constant_value(arena, sema, interner, arg))
            .collect(),
        named: attr
            .named_args
            .iter()
            .filter_map(|&(name, arg)| Some((name, constant_value(arena, sema, interner, arg)?)))
            .collect(),
    }
}

/// Lower a compile-time constant (attribute argument, generator yield).
/// `None` for anything that needs code to evaluate.
pub(crate) fn constant_value(
    arena: &SourceArena,
    sema: &SemanticModel,
    interner: &StringInterner,
    id: ExprId,
) -> Option<Expr> {
    let expr = arena.expr(id);
    let value = match &expr.kind {
        ExprKind::Null => Expr::Nil,
        ExprKind::Bool(b) => Expr::Bool(*b),
        ExprKind::Int(n) => Expr::int(*n),
        ExprKind::Float(f) => Expr::Number(*f),
        ExprKind::Char(c) => Expr::String(c.to_string()),
        ExprKind::String(name) | ExprKind::NameOf(name) => {
            Expr::String(interner.lookup(*name).to_string())
        }
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match constant_value(arena, sema, interner, *operand)? {
            Expr::Number(n) => Expr::Number(-n),
            _ => return None,
        },
        ExprKind::Ident { symbol, .. } | ExprKind::Member { symbol, .. } => {
            match &sema.symbol(*symbol)?.kind {
                SymbolKind::EnumMember { value } => Expr::int(*value),
                _ => return None,
            }
        }
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use moon_ir::ast::{Member, MethodDecl};
    use moon_ir::sema::{MethodSymbol, TypeDeclKind};
    use moon_ir::{AstBuilder, ExprRange, Span};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_support::Fixture;

    fn decl(symbol: SymbolId, name: Name, members: Vec<Member>) -> TypeDecl {
        TypeDecl {
            symbol,
            name,
            kind: TypeDeclKind::Class,
            is_static: false,
            type_params: Vec::new(),
            attributes: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            members,
            nested: Vec::new(),
            span: Span::DUMMY,
        }
    }

    #[test]
    fn mangles_nested_names() {
        let mut fx = Fixture::new();
        let (outer, _) = fx.declare("Outer", TypeDeclKind::Class);
        let (middle, _) = fx.declare_nested("Middle", TypeDeclKind::Class, outer);
        let (inner, _) = fx.declare_nested("Inner", TypeDeclKind::Struct, middle);
        let text = |n: Name| fx.interner.lookup(n).to_string();
        assert_eq!(text(mangle(&fx.sema, &fx.interner, outer)), "Outer");
        assert_eq!(text(mangle(&fx.sema, &fx.interner, inner)), "Outer_Middle_Inner");
        assert_eq!(text(mangle(&fx.sema, &fx.interner, SymbolId::NONE)), "any");
    }

    #[test]
    fn collects_generators_and_nested_types() {
        let mut fx = Fixture::new();
        let (outer, _) = fx.declare("Outer", TypeDeclKind::Class);
        let (inner, _) = fx.declare_nested("Inner", TypeDeclKind::Class, outer);
        let numbers = fx.name("Numbers");
        let method_sym = fx.sema.declare_method(outer, numbers, MethodSymbol::returning(TypeId::OBJECT));

        let interner = fx.interner.clone();
        let mut b = AstBuilder::new(&interner);
        let one = b.int(1);
        let yielded = b.yield_return(one);
        let body = b.block(&[yielded]);
        let method = MethodDecl {
            symbol: method_sym,
            name: numbers,
            type_params: Vec::new(),
            params: Vec::new(),
            ret: TypeId::OBJECT,
            body: MethodBody::Block(body),
            is_static: false,
            is_async: false,
            attributes: Vec::new(),
            ctor_initializer: None,
            span: Span::DUMMY,
        };
        let mut outer_decl = decl(outer, fx.name("Outer"), vec![Member::Method(method)]);
        outer_decl.nested.push(decl(inner, fx.name("Inner"), Vec::new()));
        b.add_type(outer_decl);
        let unit = b.finish("outer.cs");

        let mut registry = MetadataRegistry::new();
        registry.collect_unit(&unit, &fx.sema, &fx.interner);
        assert_eq!(registry.len(), 2);
        assert!(registry.is_generator(outer, method_sym));
        assert!(!registry.is_generator(inner, method_sym));
        let inner_name = registry.mangled_name(inner, &fx.sema, &fx.interner);
        assert_eq!(fx.interner.lookup(inner_name), "Outer_Inner");

        registry.reset();
        assert!(registry.is_empty());
    }

    #[test]
    fn attributes_keep_constant_arguments_once() {
        let mut fx = Fixture::new();
        let (tagged, _) = fx.declare("Tagged", TypeDeclKind::Class);
        let interner = fx.interner.clone();
        let mut b = AstBuilder::new(&interner);
        let five = b.int(5);
        let negated = b.expr(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: five,
            },
            TypeId::INT,
        );
        let runtime = b.local("x", TypeId::INT);
        let args = b.exprs(&[negated, runtime]);
        let label = b.string("hot");
        let attr = AttributeUse {
            name: b.name("Priority"),
            args,
            named_args: vec![(b.name("Label"), label)],
        };
        let mut tagged_decl = decl(tagged, fx.name("Tagged"), Vec::new());
        tagged_decl.attributes = vec![attr.clone(), attr];
        b.add_type(tagged_decl);
        let unit = b.finish("tagged.cs");

        let mut registry = MetadataRegistry::new();
        registry.collect_unit(&unit, &fx.sema, &fx.interner);
        let meta = registry.get(tagged).unwrap();
        assert_eq!(meta.attributes.len(), 1);
        assert_eq!(meta.attributes[0].args, vec![Expr::int(-5)]);
        assert_eq!(
            meta.attributes[0].named,
            vec![(fx.name("Label"), Expr::String("hot".to_string()))]
        );
    }

    #[test]
    fn non_constant_expressions_have_no_value() {
        let fx = Fixture::new();
        let interner = fx.interner.clone();
        let mut b = AstBuilder::new(&interner);
        let x = b.local("x", TypeId::INT);
        let items: ExprRange = b.exprs(&[x]);
        let list = b.expr(ExprKind::Collection(items), TypeId::OBJECT);
        let unit = b.finish("consts.cs");
        assert_eq!(constant_value(&unit.arena, &fx.sema, &fx.interner, x), None);
        assert_eq!(constant_value(&unit.arena, &fx.sema, &fx.interner, list), None);
    }
}
