use moon_ir::ast::{Member, TypeDecl};
use moon_ir::luau::{FieldAccess, FieldType, Stmt, TypeInfo};
use moon_ir::Name;

use crate::lower::Lowerer;

impl Lowerer<'_> {
    /// `export type IShape<T> = { read Area: number, Scale: (IShape<T>, number) -> () }`
    ///
    /// Events have no structural type and are left out.
    pub(super) fn lower_interface(&self, decl: &TypeDecl, name: Name, out: &mut Vec<Stmt>) {
        let this = if decl.type_params.is_empty() {
            TypeInfo::Basic(name)
        } else {
            TypeInfo::GenericName {
                name,
                args: decl.type_params.iter().map(|&p| TypeInfo::Basic(p)).collect(),
                constraints: Vec::new(),
            }
        };

        let mut fields = Vec::new();
        for member in &decl.members {
            match member {
                Member::Property(prop) => fields.push(FieldType {
                    name: prop.name,
                    ty: self.types.map(prop.ty),
                    access: if prop.has_setter {
                        FieldAccess::ReadWrite
                    } else {
                        FieldAccess::Read
                    },
                }),
                Member::Method(method) => {
                    let mut params = Vec::with_capacity(method.params.len() + 1);
                    if !method.is_static {
                        params.push(this.clone());
                    }
                    for param in &method.params {
                        params.push(if param.is_params {
                            self.types.map_params(param.ty)
                        } else {
                            self.types.map(param.ty)
                        });
                    }
                    fields.push(FieldType {
                        name: method.name,
                        ty: TypeInfo::Function {
                            params,
                            ret: Box::new(self.types.map_return(method.ret)),
                        },
                        access: FieldAccess::ReadWrite,
                    });
                }
                _ => {}
            }
        }

        out.push(Stmt::TypeAlias {
            name,
            type_params: decl.type_params.clone(),
            ty: TypeInfo::Interface(fields),
            exported: true,
        });
    }
}
