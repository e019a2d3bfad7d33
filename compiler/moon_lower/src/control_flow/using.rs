//! `using` as try/finally with a nil-guarded `Dispose`.

use moon_diagnostic::LowerResult;
use moon_ir::ast::UsingResource;
use moon_ir::luau::{BinOp, Block, Expr, Stmt};
use moon_ir::{Span, StmtId};

use super::try_catch::Finally;
use crate::lower::Lowerer;

/// What the resource guards.
pub(crate) enum UsingBody<'s> {
    /// `using (..) stmt`
    Stmt(StmtId),
    /// `using var x = ..;` guards the rest of its block.
    Rest(&'s [StmtId]),
}

impl Lowerer<'_> {
    pub(crate) fn lower_using(
        &mut self,
        resource: &UsingResource,
        body: UsingBody<'_>,
        span: Span,
        out: &mut Vec<Stmt>,
    ) -> LowerResult<()> {
        let name = match resource {
            UsingResource::Decl(decl) => {
                let init = self.expr_into(decl.init, out)?;
                out.push(Stmt::local(decl.name, init));
                decl.name
            }
            UsingResource::Expr(expr) => {
                let value = self.expr_into(*expr, out)?;
                let temp = self.fresh("resource");
                out.push(Stmt::local(temp, value));
                temp
            }
        };

        let dispose = Stmt::if_then(
            Expr::binary(BinOp::NotEq, Expr::Ident(name), Expr::Nil),
            Block::new(vec![Stmt::Expr(
                Expr::Ident(name).method_call(self.names.dispose, Vec::new()),
            )]),
        );

        self.emit_try_call(
            |this| match body {
                UsingBody::Stmt(stmt) => this.lower_block(stmt),
                UsingBody::Rest(stmts) => {
                    let mut lowered = Vec::new();
                    this.lower_stmt_list(stmts, &mut lowered)?;
                    Ok(Block::new(lowered))
                }
            },
            None,
            Finally::Lowered(Block::new(vec![dispose])),
            span,
            out,
        )
    }
}
