//! Type annotation printer.

use moon_ir::luau::{FieldAccess, FieldType, TypeInfo};

use super::Renderer;
use crate::emitter::Emitter;

impl<E: Emitter> Renderer<'_, E> {
    pub fn type_info(&mut self, ty: &TypeInfo) {
        match ty {
            TypeInfo::Basic(name) => self.name(*name),
            TypeInfo::Optional(inner) => {
                // `() -> T?` would make the return optional, not the function.
                let wrap = matches!(inner.as_ref(), TypeInfo::Function { .. });
                self.parenthesized_type(wrap, inner);
                self.ctx.emit("?");
            }
            TypeInfo::Tuple { elements, variadic } => {
                self.ctx.emit("(");
                self.comma_separated(elements, Self::type_info);
                if let Some(tail) = variadic {
                    if !elements.is_empty() {
                        self.ctx.emit(", ");
                    }
                    self.ctx.emit("...");
                    self.type_info(tail);
                }
                self.ctx.emit(")");
            }
            TypeInfo::Variadic(inner) => {
                self.ctx.emit("...");
                self.type_info(inner);
            }
            TypeInfo::Array(elem) => {
                self.ctx.emit("{ ");
                self.type_info(elem);
                self.ctx.emit(" }");
            }
            TypeInfo::Mapped { key, value } => {
                self.ctx.emit("{ [");
                self.type_info(key);
                self.ctx.emit("]: ");
                self.type_info(value);
                self.ctx.emit(" }");
            }
            TypeInfo::Function { params, ret } => {
                self.ctx.emit("(");
                self.comma_separated(params, Self::type_info);
                self.ctx.emit(") -> ");
                self.return_type(ret);
            }
            TypeInfo::Interface(fields) => {
                if fields.is_empty() {
                    self.ctx.emit("{}");
                    return;
                }
                self.ctx.emit("{ ");
                self.comma_separated(fields, Self::field_type);
                self.ctx.emit(" }");
            }
            TypeInfo::GenericName { name, args, .. } => {
                self.name(*name);
                if !args.is_empty() {
                    self.ctx.emit("<");
                    self.comma_separated(args, Self::type_info);
                    self.ctx.emit(">");
                }
            }
            TypeInfo::TypeOf(expr) => {
                self.ctx.emit("typeof(");
                self.expr(expr);
                self.ctx.emit(")");
            }
            TypeInfo::KeyOf(inner) => {
                self.ctx.emit("keyof<");
                self.type_info(inner);
                self.ctx.emit(">");
            }
            TypeInfo::IndexOf { target, key } => {
                self.ctx.emit("index<");
                self.type_info(target);
                self.ctx.emit(", ");
                self.type_info(key);
                self.ctx.emit(">");
            }
        }
    }

    fn parenthesized_type(&mut self, wrap: bool, ty: &TypeInfo) {
        if wrap {
            self.ctx.emit("(");
        }
        self.type_info(ty);
        if wrap {
            self.ctx.emit(")");
        }
    }

    fn field_type(&mut self, field: &FieldType) {
        match field.access {
            FieldAccess::ReadWrite => {}
            FieldAccess::Read => self.ctx.emit("read "),
            FieldAccess::Write => self.ctx.emit("write "),
        }
        self.name(field.name);
        self.ctx.emit(": ");
        self.type_info(&field.ty);
    }
}
