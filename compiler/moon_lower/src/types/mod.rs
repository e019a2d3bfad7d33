//! Type Mapper: Input-Language types to Luau annotations.
//!
//! Mapping never fails. Anything without a faithful Luau spelling degrades to
//! `any` (logged at `debug`), since annotations are advisory.

use moon_ir::luau::{Expr, FieldAccess, FieldType, TypeInfo};
use moon_ir::sema::{Primitive, TypeDeclKind, TypeKind, WellKnownType};
use moon_ir::{Name, SemanticModel, StringInterner, TypeId};

use crate::metadata::MetadataRegistry;

/// Read-only view used to translate `TypeId`s.
#[derive(Copy, Clone)]
pub struct TypeMapper<'a> {
    sema: &'a SemanticModel,
    interner: &'a StringInterner,
    registry: &'a MetadataRegistry,
}

impl<'a> TypeMapper<'a> {
    pub fn new(
        sema: &'a SemanticModel,
        interner: &'a StringInterner,
        registry: &'a MetadataRegistry,
    ) -> Self {
        TypeMapper {
            sema,
            interner,
            registry,
        }
    }

    fn basic(&self, text: &str) -> TypeInfo {
        TypeInfo::Basic(self.interner.intern(text))
    }

    fn any(&self) -> TypeInfo {
        self.basic("any")
    }

    fn unit(&self) -> TypeInfo {
        TypeInfo::Tuple {
            elements: Vec::new(),
            variadic: None,
        }
    }

    /// Annotation for a value of type `ty`.
    pub fn map(&self, ty: TypeId) -> TypeInfo {
        match self.sema.type_kind(ty) {
            TypeKind::Primitive(p) => self.primitive(*p),
            TypeKind::Nullable(inner) => TypeInfo::optional(self.map(*inner)),
            TypeKind::Array(elem) => TypeInfo::array(self.map(*elem)),
            TypeKind::Tuple(elements) => TypeInfo::Tuple {
                elements: elements.iter().map(|e| self.map(e.ty)).collect(),
                variadic: None,
            },
            TypeKind::Named { symbol, args } => self.named(ty, *symbol, args),
            TypeKind::TypeParam { name, constraints } => TypeInfo::GenericName {
                name: *name,
                args: Vec::new(),
                constraints: constraints.iter().map(|&c| self.map(c)).collect(),
            },
            TypeKind::Function { params, ret } => TypeInfo::Function {
                params: params.iter().map(|&p| self.map(p)).collect(),
                ret: Box::new(self.map_return(*ret)),
            },
            TypeKind::Error => {
                tracing::debug!(?ty, "unresolved type mapped to any");
                self.any()
            }
        }
    }

    /// Annotation for a return position: `void` becomes `()`.
    pub fn map_return(&self, ty: TypeId) -> TypeInfo {
        if ty == TypeId::VOID {
            return self.unit();
        }
        self.map(ty)
    }

    /// Element annotation of a trailing `params T[]` parameter: `...T`.
    ///
    /// The result is the `T` of the `...: T` tail; a nullable element keeps
    /// its `?`.
    pub fn map_params_element(&self, array_ty: TypeId) -> TypeInfo {
        match self.sema.type_kind(self.sema.types.non_nullable(array_ty)) {
            TypeKind::Array(elem) => self.map(*elem),
            _ => {
                let args = self.sema.type_args(array_ty);
                args.first().map_or_else(|| self.any(), |&elem| self.map(elem))
            }
        }
    }

    /// `Variadic(..)` form of [`TypeMapper::map_params_element`].
    pub fn map_params(&self, array_ty: TypeId) -> TypeInfo {
        TypeInfo::variadic(self.map_params_element(array_ty))
    }

    fn primitive(&self, p: Primitive) -> TypeInfo {
        match p {
            Primitive::Void => self.unit(),
            Primitive::Bool => self.basic("boolean"),
            Primitive::Char | Primitive::String => self.basic("string"),
            Primitive::Object | Primitive::Dynamic => self.any(),
            Primitive::Null => self.basic("nil"),
            Primitive::Byte
            | Primitive::Int
            | Primitive::UInt
            | Primitive::Long
            | Primitive::Float
            | Primitive::Double
            | Primitive::Decimal => self.basic("number"),
        }
    }

    fn arg(&self, args: &[TypeId], index: usize) -> TypeInfo {
        args.get(index).map_or_else(|| self.any(), |&a| self.map(a))
    }

    fn named(&self, ty: TypeId, symbol: moon_ir::SymbolId, args: &[TypeId]) -> TypeInfo {
        let Some(type_sym) = self.sema.symbol(symbol).and_then(|s| s.as_type()) else {
            tracing::debug!(?ty, "named type without a type symbol mapped to any");
            return self.any();
        };

        if let Some(well_known) = type_sym.well_known {
            return self.well_known(well_known, symbol, args);
        }

        let name = self.registry.mangled_name(symbol, self.sema, self.interner);
        match type_sym.decl_kind {
            TypeDeclKind::Enum => self.enum_type(name),
            TypeDeclKind::Delegate => TypeInfo::Function {
                params: vec![TypeInfo::variadic(self.any())],
                ret: Box::new(TypeInfo::variadic(self.any())),
            },
            _ if args.is_empty() => TypeInfo::Basic(name),
            _ => TypeInfo::GenericName {
                name,
                args: args.iter().map(|&a| self.map(a)).collect(),
                constraints: Vec::new(),
            },
        }
    }

    /// `index<typeof(E), keyof<typeof(E)>>`: the member values of enum `E`.
    fn enum_type(&self, name: Name) -> TypeInfo {
        let table = TypeInfo::TypeOf(Box::new(Expr::Ident(name)));
        TypeInfo::IndexOf {
            target: Box::new(table.clone()),
            key: Box::new(TypeInfo::KeyOf(Box::new(table))),
        }
    }

    fn well_known(
        &self,
        well_known: WellKnownType,
        symbol: moon_ir::SymbolId,
        args: &[TypeId],
    ) -> TypeInfo {
        match well_known {
            WellKnownType::List
            | WellKnownType::IEnumerable
            | WellKnownType::ICollection
            | WellKnownType::IList
            | WellKnownType::IReadOnlyList => TypeInfo::array(self.arg(args, 0)),
            WellKnownType::HashSet => TypeInfo::mapped(self.arg(args, 0), self.basic("boolean")),
            WellKnownType::Dictionary | WellKnownType::IDictionary => {
                TypeInfo::mapped(self.arg(args, 0), self.arg(args, 1))
            }
            WellKnownType::KeyValuePair => TypeInfo::Interface(vec![
                FieldType {
                    name: self.interner.intern("Key"),
                    ty: self.arg(args, 0),
                    access: FieldAccess::ReadWrite,
                },
                FieldType {
                    name: self.interner.intern("Value"),
                    ty: self.arg(args, 1),
                    access: FieldAccess::ReadWrite,
                },
            ]),
            WellKnownType::Action => TypeInfo::Function {
                params: args.iter().map(|&a| self.map(a)).collect(),
                ret: Box::new(self.unit()),
            },
            WellKnownType::Func => match args.split_last() {
                Some((&ret, params)) => TypeInfo::Function {
                    params: params.iter().map(|&a| self.map(a)).collect(),
                    ret: Box::new(self.map_return(ret)),
                },
                None => TypeInfo::Function {
                    params: Vec::new(),
                    ret: Box::new(self.any()),
                },
            },
            WellKnownType::Task => match args.first() {
                Some(&inner) => self.map(inner),
                None => self.unit(),
            },
            WellKnownType::String => self.basic("string"),
            WellKnownType::Exception
            | WellKnownType::IDisposable
            | WellKnownType::Enumerable
            | WellKnownType::Math
            | WellKnownType::Console => {
                let name = self.registry.mangled_name(symbol, self.sema, self.interner);
                if args.is_empty() {
                    TypeInfo::Basic(name)
                } else {
                    TypeInfo::GenericName {
                        name,
                        args: args.iter().map(|&a| self.map(a)).collect(),
                        constraints: Vec::new(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
