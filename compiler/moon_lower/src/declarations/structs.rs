//! Plain data structs: a shape alias and a table-building constructor.
//!
//! ```text
//! export type Point = { X: number, Y: number }
//! local Point
//! do
//!   Point = {}
//!   function Point.new(X: number?, Y: number?): Point
//!     return { X = if X == nil then 0 else X, Y = if Y == nil then 0 else Y }
//!   end
//!   Point.__interfaces = { "IShape" }
//! end
//! CS.defineGlobal("Point", Point)
//! ```

use moon_diagnostic::LowerResult;
use moon_ir::ast::{Member, TypeDecl};
use moon_ir::luau::{BinOp, Binding, Block, Expr, FieldAccess, FieldType, Function, FunctionName, Stmt, TableField, TypeInfo};
use moon_ir::{ExprId, Name, TypeId};

use crate::lower::Lowerer;

impl Lowerer<'_> {
    /// A struct with no methods and no explicit constructor.
    pub(super) fn is_plain_struct(decl: &TypeDecl) -> bool {
        !decl
            .members
            .iter()
            .any(|m| matches!(m, Member::Method(_) | Member::Constructor(_)))
    }

    /// Instance fields and auto-properties, in declaration order.
    fn instance_slots(decl: &TypeDecl) -> Vec<(Name, TypeId, ExprId)> {
        decl.members
            .iter()
            .filter_map(|m| match m {
                Member::Field(f) if !f.is_static && !f.is_const => Some((f.name, f.ty, f.init)),
                Member::Property(p) if !p.is_static && p.is_auto() => Some((p.name, p.ty, p.init)),
                _ => None,
            })
            .collect()
    }

    pub(super) fn lower_plain_struct(
        &mut self,
        decl: &TypeDecl,
        name: Name,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let slots = Self::instance_slots(decl);

        let shape = slots
            .iter()
            .map(|&(field, ty, _)| FieldType {
                name: field,
                ty: self.types.map(ty),
                access: FieldAccess::ReadWrite,
            })
            .collect();
        out.push(Stmt::TypeAlias {
            name,
            type_params: decl.type_params.clone(),
            ty: TypeInfo::Interface(shape),
            exported: true,
        });
        out.push(Stmt::local_uninit(vec![name]));

        let mut body = vec![Stmt::assign(Expr::Ident(name), Expr::Table(Vec::new()))];
        body.push(self.struct_constructor(decl, name, &slots)?);
        self.metadata_fields(decl, name, &mut body);
        self.static_initializers(decl, name, &mut body)?;
        self.static_constructor(decl, &mut body)?;

        out.push(Stmt::Do(Block::new(body)));
        out.push(self.define_global(name));
        Ok(())
    }

    fn struct_constructor(
        &mut self,
        decl: &TypeDecl,
        name: Name,
        slots: &[(Name, TypeId, ExprId)],
    ) -> LowerResult<Stmt> {
        self.reset_temps();
        let mut prologue = Vec::new();
        let mut fields = Vec::with_capacity(slots.len());
        let mut params = Vec::with_capacity(slots.len());
        for &(field, ty, init) in slots {
            params.push(Binding::typed(field, TypeInfo::optional(self.types.map(ty))));
            let fallback = self.initial_value(init, ty, &mut prologue)?;
            let value = if fallback == Expr::Nil {
                Expr::Ident(field)
            } else {
                Expr::if_else(
                    Expr::binary(BinOp::Eq, Expr::Ident(field), Expr::Nil),
                    fallback,
                    Expr::Ident(field),
                )
            };
            fields.push(TableField::Named(field, value));
        }
        prologue.push(Stmt::ret(Expr::Table(fields)));

        let ret = if decl.type_params.is_empty() {
            TypeInfo::Basic(name)
        } else {
            TypeInfo::GenericName {
                name,
                args: decl.type_params.iter().map(|&p| TypeInfo::Basic(p)).collect(),
                constraints: Vec::new(),
            }
        };
        Ok(Stmt::FunctionDecl {
            name: FunctionName {
                path: vec![name, self.names.new],
                method: None,
            },
            func: Function {
                type_params: decl.type_params.clone(),
                params,
                variadic: None,
                ret: Some(ret),
                body: Block::new(prologue),
            },
        })
    }
}
