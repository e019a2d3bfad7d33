//! Statement printer.
//!
//! Expressions and types live in the sibling modules; everything funnels
//! through one [`Renderer`] so nested function bodies inherit the current
//! indentation.

mod expr;
mod literals;
mod types;

use moon_ir::luau::{Binding, Block, Function, FunctionName, Stmt, TypeInfo};
use moon_ir::{Name, StringLookup};

use crate::context::RenderContext;
use crate::emitter::{Emitter, StringEmitter};

pub struct Renderer<'a, E: Emitter = StringEmitter> {
    ctx: RenderContext<E>,
    names: &'a dyn StringLookup,
}

/// Visit statements with `Seq` nodes spliced into their parent.
fn for_each_flat<'t>(stmts: &'t [Stmt], f: &mut impl FnMut(&'t Stmt)) {
    for stmt in stmts {
        match stmt {
            Stmt::Seq(inner) => for_each_flat(inner, f),
            other => f(other),
        }
    }
}

impl<'a, E: Emitter> Renderer<'a, E> {
    pub fn new(ctx: RenderContext<E>, names: &'a dyn StringLookup) -> Self {
        Renderer { ctx, names }
    }

    pub fn into_context(self) -> RenderContext<E> {
        self.ctx
    }

    fn name(&mut self, name: Name) {
        let text = self.names.lookup(name);
        self.ctx.emit(text);
    }

    fn comma_separated<T>(&mut self, items: &[T], mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.ctx.emit(", ");
            }
            each(self, item);
        }
    }

    /// Top-level sequence: every statement followed by a blank line.
    pub fn top_level(&mut self, block: &Block) {
        let mut flat = Vec::new();
        for_each_flat(&block.stmts, &mut |s| flat.push(s));
        for stmt in flat {
            self.stmt(stmt);
            self.ctx.end_line();
            self.ctx.end_line();
        }
    }

    /// Indented body of a compound statement; the caller prints the closer.
    fn body(&mut self, block: &Block) {
        let mut flat = Vec::new();
        for_each_flat(&block.stmts, &mut |s| flat.push(s));
        self.ctx.indent();
        for stmt in flat {
            self.ctx.new_line();
            self.stmt(stmt);
        }
        self.ctx.dedent();
    }

    fn body_then(&mut self, block: &Block, closer: &str) {
        self.body(block);
        self.ctx.new_line();
        self.ctx.emit(closer);
    }

    pub fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local { bindings, values } => {
                self.ctx.emit("local ");
                self.comma_separated(bindings, Self::binding);
                if !values.is_empty() {
                    self.ctx.emit(" = ");
                    self.expr_list(values);
                }
            }
            Stmt::Assign { targets, values } => {
                self.expr_list(targets);
                self.ctx.emit(" = ");
                self.expr_list(values);
            }
            Stmt::CompoundAssign { op, target, value } => {
                self.expr(target);
                self.ctx.emit(" ");
                self.ctx.emit(op.as_str());
                self.ctx.emit(" ");
                self.expr(value);
            }
            Stmt::If {
                cond,
                then_block,
                else_ifs,
                else_block,
            } => {
                self.ctx.emit("if ");
                self.expr(cond);
                self.ctx.emit(" then");
                self.body(then_block);
                for (cond, block) in else_ifs {
                    self.ctx.new_line();
                    self.ctx.emit("elseif ");
                    self.expr(cond);
                    self.ctx.emit(" then");
                    self.body(block);
                }
                if let Some(block) = else_block {
                    self.ctx.new_line();
                    self.ctx.emit("else");
                    self.body(block);
                }
                self.ctx.new_line();
                self.ctx.emit("end");
            }
            Stmt::While { cond, body } => {
                self.ctx.emit("while ");
                self.expr(cond);
                self.ctx.emit(" do");
                self.body_then(body, "end");
            }
            Stmt::Repeat { body, until } => {
                self.ctx.emit("repeat");
                self.body(body);
                self.ctx.new_line();
                self.ctx.emit("until ");
                self.expr(until);
            }
            Stmt::NumericFor {
                var,
                start,
                end,
                step,
                body,
            } => {
                self.ctx.emit("for ");
                self.name(*var);
                self.ctx.emit(" = ");
                self.expr(start);
                self.ctx.emit(", ");
                self.expr(end);
                if let Some(step) = step {
                    self.ctx.emit(", ");
                    self.expr(step);
                }
                self.ctx.emit(" do");
                self.body_then(body, "end");
            }
            Stmt::GenericFor { vars, iter, body } => {
                self.ctx.emit("for ");
                self.comma_separated(vars, |r, v| r.name(*v));
                self.ctx.emit(" in ");
                self.expr_list(iter);
                self.ctx.emit(" do");
                self.body_then(body, "end");
            }
            Stmt::Return(values) => {
                self.ctx.emit("return");
                if !values.is_empty() {
                    self.ctx.emit(" ");
                    self.expr_list(values);
                }
            }
            Stmt::Break => self.ctx.emit("break"),
            Stmt::Continue => self.ctx.emit("continue"),
            Stmt::FunctionDecl { name, func } => {
                self.ctx.emit("function ");
                self.function_name(name);
                self.function_tail(func);
            }
            Stmt::LocalFunction { name, func } => {
                self.ctx.emit("local function ");
                self.name(*name);
                self.function_tail(func);
            }
            Stmt::Do(block) => {
                self.ctx.emit("do");
                self.body_then(block, "end");
            }
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::TypeAlias {
                name,
                type_params,
                ty,
                exported,
            } => {
                if *exported {
                    self.ctx.emit("export ");
                }
                self.ctx.emit("type ");
                self.name(*name);
                self.type_params(type_params);
                self.ctx.emit(" = ");
                self.type_info(ty);
            }
            Stmt::Seq(stmts) => {
                // Only reachable when a Seq is rendered on its own.
                let mut flat = Vec::new();
                for_each_flat(stmts, &mut |s| flat.push(s));
                for (i, stmt) in flat.into_iter().enumerate() {
                    if i > 0 {
                        self.ctx.new_line();
                    }
                    self.stmt(stmt);
                }
            }
        }
    }

    fn binding(&mut self, binding: &Binding) {
        self.name(binding.name);
        if let Some(ty) = &binding.ty {
            self.ctx.emit(": ");
            self.type_info(ty);
        }
    }

    fn function_name(&mut self, name: &FunctionName) {
        for (i, part) in name.path.iter().enumerate() {
            if i > 0 {
                self.ctx.emit(".");
            }
            self.name(*part);
        }
        if let Some(method) = name.method {
            self.ctx.emit(":");
            self.name(method);
        }
    }

    fn type_params(&mut self, params: &[Name]) {
        if params.is_empty() {
            return;
        }
        self.ctx.emit("<");
        self.comma_separated(params, |r, p| r.name(*p));
        self.ctx.emit(">");
    }

    /// `<T>(params): R` followed by the body and `end`.
    fn function_tail(&mut self, func: &Function) {
        self.type_params(&func.type_params);
        self.ctx.emit("(");
        self.comma_separated(&func.params, Self::binding);
        if let Some(variadic) = &func.variadic {
            if !func.params.is_empty() {
                self.ctx.emit(", ");
            }
            self.ctx.emit("...");
            if let Some(ty) = variadic {
                self.ctx.emit(": ");
                self.type_info(ty);
            }
        }
        self.ctx.emit(")");
        if let Some(ret) = &func.ret {
            self.ctx.emit(": ");
            self.return_type(ret);
        }
        self.body_then(&func.body, "end");
    }

    fn return_type(&mut self, ty: &TypeInfo) {
        match ty {
            TypeInfo::Tuple { elements, variadic } if elements.is_empty() && variadic.is_none() => {
                self.ctx.emit("()");
            }
            other => self.type_info(other),
        }
    }
}
