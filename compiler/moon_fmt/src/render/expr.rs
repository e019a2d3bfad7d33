//! Expression printer with precedence-driven parenthesisation.

use moon_ir::luau::{Expr, InterpPart, TableField, UnOp};

use super::literals::{escape_interpolated, format_number, quote};
use super::Renderer;
use crate::emitter::Emitter;

/// Context that accepts any expression.
const ANY: u8 = 0;
/// Operand of a unary operator: only `^` binds tighter.
const UNARY_OPERAND: u8 = UnOp::PRECEDENCE;
/// Forces parentheses around any operator expression.
const ATOM: u8 = 9;

/// Whether `expr` is a Luau prefix expression (may be called or indexed).
fn is_prefix(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Ident(_)
            | Expr::Member { .. }
            | Expr::Index { .. }
            | Expr::Call { .. }
            | Expr::MethodCall { .. }
            | Expr::Paren(_)
            | Expr::TypeOf(_)
    )
}

fn is_negative_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Number(n) if n.is_sign_negative())
}

/// Tables with keyed entries or function values get one entry per line.
fn is_multiline_table(fields: &[TableField]) -> bool {
    fields.iter().any(|f| match f {
        TableField::Named(..) | TableField::Keyed(..) => true,
        TableField::Positional(value) => matches!(value, Expr::Function(_)),
    })
}

impl<E: Emitter> Renderer<'_, E> {
    pub fn expr(&mut self, expr: &Expr) {
        self.expr_prec(expr, ANY);
    }

    pub(super) fn expr_list(&mut self, exprs: &[Expr]) {
        self.comma_separated(exprs, Self::expr);
    }

    fn parenthesized(&mut self, wrap: bool, f: impl FnOnce(&mut Self)) {
        if wrap {
            self.ctx.emit("(");
        }
        f(self);
        if wrap {
            self.ctx.emit(")");
        }
    }

    /// Render `expr` where the surrounding operator binds at `min`.
    fn expr_prec(&mut self, expr: &Expr, min: u8) {
        match expr {
            Expr::Nil => self.ctx.emit("nil"),
            Expr::Bool(true) => self.ctx.emit("true"),
            Expr::Bool(false) => self.ctx.emit("false"),
            Expr::Number(value) => {
                let text = format_number(*value);
                let wrap = (value.is_sign_negative() || value.is_nan()) && min > UNARY_OPERAND;
                self.parenthesized(wrap, |r| r.ctx.emit(&text));
            }
            Expr::String(text) => self.ctx.emit(&quote(text)),
            Expr::Vararg => self.ctx.emit("..."),
            Expr::Ident(name) => self.name(*name),
            Expr::Member { object, name } => {
                self.prefix(object);
                self.ctx.emit(".");
                self.name(*name);
            }
            Expr::Index { object, key } => {
                self.prefix(object);
                self.ctx.emit("[");
                self.expr(key);
                self.ctx.emit("]");
            }
            Expr::Call { callee, args } => {
                self.prefix(callee);
                self.args(args);
            }
            Expr::MethodCall {
                receiver,
                method,
                args,
            } => {
                self.prefix(receiver);
                self.ctx.emit(":");
                self.name(*method);
                self.args(args);
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                let (left_min, right_min) = if op.is_right_assoc() {
                    (prec + 1, prec)
                } else {
                    (prec, prec + 1)
                };
                self.parenthesized(prec < min, |r| {
                    r.expr_prec(lhs, left_min);
                    r.ctx.emit(" ");
                    r.ctx.emit(op.as_str());
                    r.ctx.emit(" ");
                    r.expr_prec(rhs, right_min);
                });
            }
            Expr::Unary { op, operand } => {
                // `- -x` must not print as the comment marker `--`.
                let operand_min = match (op, operand.as_ref()) {
                    (UnOp::Neg, Expr::Unary { op: UnOp::Neg, .. }) => ATOM,
                    (UnOp::Neg, inner) if is_negative_literal(inner) => ATOM,
                    _ => UNARY_OPERAND,
                };
                self.parenthesized(UnOp::PRECEDENCE < min, |r| {
                    r.ctx.emit(op.as_str());
                    r.expr_prec(operand, operand_min);
                });
            }
            Expr::Table(fields) => self.table(fields),
            Expr::Function(func) => {
                self.ctx.emit("function");
                self.function_tail(func);
            }
            Expr::Cast { expr, ty } => {
                let simple = !matches!(
                    expr.as_ref(),
                    Expr::Binary { .. } | Expr::Unary { .. } | Expr::IfElse { .. } | Expr::Cast { .. }
                ) && !is_negative_literal(expr);
                self.parenthesized(!simple, |r| r.expr(expr));
                self.ctx.emit(" :: ");
                self.type_info(ty);
            }
            Expr::Interpolated(parts) => {
                self.ctx.emit("`");
                for part in parts {
                    match part {
                        InterpPart::Text(text) => self.ctx.emit(&escape_interpolated(text)),
                        InterpPart::Expr(value) => {
                            self.ctx.emit("{");
                            self.expr(value);
                            self.ctx.emit("}");
                        }
                    }
                }
                self.ctx.emit("`");
            }
            Expr::IfElse {
                cond,
                then_value,
                else_value,
            } => {
                self.parenthesized(min > ANY, |r| {
                    r.ctx.emit("if ");
                    r.expr(cond);
                    r.ctx.emit(" then ");
                    r.expr(then_value);
                    r.ctx.emit(" else ");
                    r.expr(else_value);
                });
            }
            Expr::Paren(inner) => {
                self.ctx.emit("(");
                self.expr(inner);
                self.ctx.emit(")");
            }
            Expr::TypeOf(inner) => {
                self.ctx.emit("typeof(");
                self.expr(inner);
                self.ctx.emit(")");
            }
        }
    }

    /// Callee/receiver position: non-prefix expressions need parentheses.
    fn prefix(&mut self, expr: &Expr) {
        self.parenthesized(!is_prefix(expr), |r| r.expr(expr));
    }

    fn args(&mut self, args: &[Expr]) {
        self.ctx.emit("(");
        self.expr_list(args);
        self.ctx.emit(")");
    }

    fn table(&mut self, fields: &[TableField]) {
        if fields.is_empty() {
            self.ctx.emit("{}");
            return;
        }
        if !is_multiline_table(fields) {
            self.ctx.emit("{ ");
            self.comma_separated(fields, Self::table_field);
            self.ctx.emit(" }");
            return;
        }
        self.ctx.emit("{");
        self.ctx.indent();
        for field in fields {
            self.ctx.new_line();
            self.table_field(field);
            self.ctx.emit(",");
        }
        self.ctx.dedent();
        self.ctx.new_line();
        self.ctx.emit("}");
    }

    fn table_field(&mut self, field: &TableField) {
        match field {
            TableField::Positional(value) => self.expr(value),
            TableField::Named(name, value) => {
                self.name(*name);
                self.ctx.emit(" = ");
                self.expr(value);
            }
            TableField::Keyed(key, value) => {
                self.ctx.emit("[");
                self.expr(key);
                self.ctx.emit("] = ");
                self.expr(value);
            }
        }
    }
}

