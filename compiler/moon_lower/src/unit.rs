//! Whole-unit lowering: the chunk wrapper around types and top-level code.

use moon_diagnostic::LowerResult;
use moon_ir::luau::{Block, Chunk, Expr, Stmt, TableField};
use moon_ir::sema::TypeDeclKind;
use moon_ir::{SemanticModel, SourceUnit};

use crate::context::CompilationContext;
use crate::control_flow::Frame;
use crate::lower::Lowerer;

/// Lower one source unit into a chunk.
///
/// The registry in `ctx` must already hold every unit of the compilation
/// (see [`MetadataRegistry::collect_unit`](crate::MetadataRegistry::collect_unit)).
#[tracing::instrument(level = "debug", skip_all, fields(unit = ctx.interner.lookup(unit.name)))]
pub fn lower_unit(
    unit: &SourceUnit,
    sema: &SemanticModel,
    ctx: &CompilationContext,
) -> LowerResult<Chunk> {
    let mut lowerer = Lowerer::new(&unit.arena, sema, &ctx.interner, &ctx.registry, ctx.options);
    let mut body = vec![lowerer.runtime_import()];

    for decl in &unit.types {
        lowerer.lower_type_decl(decl, &mut body)?;
    }

    lowerer.reset_temps();
    let statements = unit.arena.stmt_list(unit.statements);
    let frame = Frame::Function { generator: false };
    let (top_level, _) = lowerer.with_frame(frame, |this| {
        let mut out = Vec::new();
        this.lower_stmt_list(statements, &mut out)?;
        Ok(out)
    })?;
    body.extend(top_level);

    if ctx.options.script_type.returns_exports() {
        let exports = unit
            .types
            .iter()
            .filter(|decl| !matches!(decl.kind, TypeDeclKind::Interface | TypeDeclKind::Delegate))
            .map(|decl| {
                let name = lowerer.type_name(decl.symbol);
                TableField::Named(name, Expr::Ident(name))
            })
            .collect();
        body.push(Stmt::ret(Expr::Table(exports)));
    }

    tracing::debug!(statements = body.len(), "lowered unit");
    Ok(Chunk::new(Block::new(body)))
}

impl Lowerer<'_> {
    /// `local CS = require(game:GetService("ReplicatedStorage"):WaitForChild("RuntimeLib"))`
    fn runtime_import(&self) -> Stmt {
        let game = Expr::Ident(self.interner.intern("game"));
        let storage = game.method_call(
            self.interner.intern("GetService"),
            vec![Expr::string("ReplicatedStorage")],
        );
        let module = storage.method_call(
            self.interner.intern("WaitForChild"),
            vec![Expr::string("RuntimeLib")],
        );
        let require = self.global_call(self.interner.intern("require"), vec![module]);
        Stmt::local(self.names.cs, require)
    }
}
