use moon_ir::ast::{Member, TypeDecl};
use moon_ir::luau::{Expr, Stmt, TableField};
use moon_ir::Name;

use crate::lower::Lowerer;

impl Lowerer<'_> {
    /// `local Color = table.freeze({ Red = 0, Green = 1 })`
    pub(super) fn lower_enum(&self, decl: &TypeDecl, name: Name, out: &mut Vec<Stmt>) {
        let members = decl
            .members
            .iter()
            .filter_map(|m| match m {
                Member::EnumMember(member) => Some(TableField::Named(member.name, Expr::int(member.value))),
                _ => None,
            })
            .collect();
        let frozen = Expr::Ident(self.names.table)
            .member(self.names.freeze)
            .call(vec![Expr::Table(members)]);
        out.push(Stmt::local(name, frozen));
        out.push(self.define_global(name));
    }
}
