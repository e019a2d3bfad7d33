//! Type declarations.
//!
//! Every runtime type follows one emission order:
//!
//! 1. predeclare the (mangled) local
//! 2. metatable and constructor boilerplate, then methods and accessors
//! 3. `__attributes`, `__interfaces`, `__base`
//! 4. static field, property and event initializers in declaration order
//! 5. the static constructor body
//! 6. `CS.defineGlobal(name, value)`
//!
//! Nested types are emitted, in full, before their container. Interfaces and
//! delegates have no runtime value and only contribute type aliases.

mod class;
mod enums;
mod interfaces;
mod structs;

use moon_diagnostic::LowerResult;
use moon_ir::ast::{Member, TypeDecl};
use moon_ir::luau::{Expr, Stmt, TableField};
use moon_ir::sema::TypeDeclKind;
use moon_ir::{ExprId, Name, TypeId};

use crate::control_flow::Frame;
use crate::lower::{Lowerer, TypeScope};
use crate::metadata::AttributeMeta;

impl Lowerer<'_> {
    /// Emit `decl` and its nested types into `out`.
    pub(crate) fn lower_type_decl(&mut self, decl: &TypeDecl, out: &mut Vec<Stmt>) -> LowerResult<()> {
        for nested in &decl.nested {
            self.lower_type_decl(nested, out)?;
        }

        let name = self.type_name(decl.symbol);
        tracing::debug!(name = self.text(name), kind = ?decl.kind, "lowering type");
        let scope = TypeScope {
            base: self.base_name(decl),
        };
        let saved = self.scope.replace(scope);
        let result = match decl.kind {
            TypeDeclKind::Interface => {
                self.lower_interface(decl, name, out);
                Ok(())
            }
            TypeDeclKind::Enum => {
                self.lower_enum(decl, name, out);
                Ok(())
            }
            TypeDeclKind::Delegate => Ok(()),
            TypeDeclKind::Struct if Self::is_plain_struct(decl) => {
                self.lower_plain_struct(decl, name, out)
            }
            TypeDeclKind::Class | TypeDeclKind::Struct | TypeDeclKind::Record => {
                self.lower_class(decl, name, out)
            }
        };
        self.scope = saved;
        result
    }

    /// Mangled name of a source base class.
    fn base_name(&self, decl: &TypeDecl) -> Option<Name> {
        let base = decl.base?;
        match self.sema.type_symbol_of(base) {
            Some((symbol, sym)) if sym.well_known.is_none() => Some(self.type_name(symbol)),
            _ => None,
        }
    }

    /// `CS.defineGlobal("Name", Name)`
    pub(crate) fn define_global(&self, name: Name) -> Stmt {
        Stmt::Expr(self.cs_call(
            self.names.define_global,
            vec![Expr::string(self.text(name)), Expr::Ident(name)],
        ))
    }

    fn attribute_table(&self, attr: &AttributeMeta) -> Expr {
        let mut fields = vec![
            TableField::Named(self.names.name_key, Expr::string(self.text(attr.name))),
            TableField::Named(
                self.names.args_key,
                Expr::Table(attr.args.iter().cloned().map(TableField::Positional).collect()),
            ),
        ];
        if !attr.named.is_empty() {
            fields.push(TableField::Named(
                self.names.named_key,
                Expr::Table(
                    attr.named
                        .iter()
                        .map(|(key, value)| TableField::Named(*key, value.clone()))
                        .collect(),
                ),
            ));
        }
        Expr::Table(fields)
    }

    /// `__attributes`, `__interfaces` and `__base` from the type's metadata.
    pub(crate) fn metadata_fields(&self, decl: &TypeDecl, name: Name, out: &mut Vec<Stmt>) {
        let Some(meta) = self.registry.get(decl.symbol) else {
            return;
        };
        let target = Expr::Ident(name);
        if !meta.attributes.is_empty() {
            let attributes = meta
                .attributes
                .iter()
                .map(|attr| TableField::Positional(self.attribute_table(attr)))
                .collect();
            out.push(Stmt::assign(
                target.clone().member(self.names.attributes),
                Expr::Table(attributes),
            ));
        }

        let interfaces: Vec<TableField> = meta
            .interfaces
            .iter()
            .filter_map(|&iface| self.sema.type_symbol_of(iface))
            .map(|(symbol, _)| {
                TableField::Positional(Expr::string(self.text(self.type_name(symbol))))
            })
            .collect();
        if !interfaces.is_empty() {
            out.push(Stmt::assign(
                target.clone().member(self.names.interfaces),
                Expr::Table(interfaces),
            ));
        }

        if let Some(base) = self.scope.and_then(|s| s.base) {
            out.push(Stmt::assign(target.member(self.names.base), Expr::Ident(base)));
        }
    }

    /// Static fields, auto-properties and events, in declaration order.
    pub(crate) fn static_initializers(
        &mut self,
        decl: &TypeDecl,
        name: Name,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        self.reset_temps();
        for member in &decl.members {
            let (member_name, value) = match member {
                Member::Field(field) if field.is_static || field.is_const => {
                    (field.name, self.initial_value(field.init, field.ty, out)?)
                }
                Member::Property(prop) if prop.is_static && prop.is_auto() => {
                    (prop.name, self.initial_value(prop.init, prop.ty, out)?)
                }
                Member::Event(event) if event.is_static => (event.name, self.new_signal()),
                _ => continue,
            };
            if value != Expr::Nil {
                out.push(Stmt::assign(Expr::Ident(name).member(member_name), value));
            }
        }
        Ok(())
    }

    /// Declared initializer, or `default(T)`.
    pub(crate) fn initial_value(
        &mut self,
        init: ExprId,
        ty: TypeId,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<Expr> {
        match init.present() {
            Some(init) => self.expr_into(init, out),
            None => Ok(self.default_value(ty)),
        }
    }

    /// `CS.Signal.new()`
    pub(crate) fn new_signal(&self) -> Expr {
        self.cs(self.names.signal)
            .member(self.names.new)
            .call(Vec::new())
    }

    /// Body of `static T() { .. }`, run in place.
    pub(crate) fn static_constructor(&mut self, decl: &TypeDecl, out: &mut Vec<Stmt>) -> LowerResult<()> {
        let Some(body) = decl.static_constructor() else {
            return Ok(());
        };
        self.reset_temps();
        let frame = Frame::Function { generator: false };
        let (block, _) = self.with_frame(frame, |this| this.lower_block(body))?;
        out.extend(block.stmts);
        Ok(())
    }
}
