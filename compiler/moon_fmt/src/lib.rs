//! Luau renderer.
//!
//! Prints a [`luau`](moon_ir::luau) tree as canonical text:
//!
//! - two-space indentation, one statement per line
//! - a blank line after every top-level statement
//! - `local`-prefixed bindings and `a:m()` only for receiver calls
//! - parentheses only where Luau operator precedence requires them
//!
//! Rendering is a pure function of the tree: the same tree always yields the
//! same bytes.
//!
//! # Modules
//!
//! - [`emitter`]: the output sink
//! - [`context`]: indentation tracking
//! - `render`: statement, expression and type printers

pub mod context;
pub mod emitter;
mod render;

pub use context::{RenderContext, INDENT_WIDTH};
pub use emitter::{Emitter, StringEmitter};
pub use render::Renderer;

use moon_ir::luau::{Block, Chunk, Expr, Stmt, TypeInfo};
use moon_ir::StringLookup;

/// Render a whole output file.
pub fn render_chunk(chunk: &Chunk, names: &dyn StringLookup) -> String {
    render_block(&chunk.body, names)
}

/// Render statements as a top-level sequence.
pub fn render_block(block: &Block, names: &dyn StringLookup) -> String {
    let mut renderer = Renderer::new(RenderContext::new(), names);
    renderer.top_level(block);
    renderer.into_context().finish()
}

/// Render one statement at indentation level zero, without a trailing newline.
pub fn render_stmt(stmt: &Stmt, names: &dyn StringLookup) -> String {
    let mut renderer = Renderer::new(RenderContext::new(), names);
    renderer.stmt(stmt);
    renderer.into_context().into_raw()
}

pub fn render_expr(expr: &Expr, names: &dyn StringLookup) -> String {
    let mut renderer = Renderer::new(RenderContext::new(), names);
    renderer.expr(expr);
    renderer.into_context().into_raw()
}

pub fn render_type(ty: &TypeInfo, names: &dyn StringLookup) -> String {
    let mut renderer = Renderer::new(RenderContext::new(), names);
    renderer.type_info(ty);
    renderer.into_context().into_raw()
}
