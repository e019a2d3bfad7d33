//! Luau target AST.
//!
//! Built by `moon_lower`, printed by `moon_fmt`. Pure data: no node knows how
//! to render itself.

mod ast;
mod type_info;

pub use ast::{
    BinOp, Binding, Block, CompoundOp, Expr, Function, FunctionName, InterpPart, Stmt,
    TableField, UnOp,
};
pub use type_info::{FieldAccess, FieldType, TypeInfo};

/// One rendered output file.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Chunk {
    pub body: Block,
}

impl Chunk {
    pub fn new(body: Block) -> Self {
        Chunk { body }
    }
}

#[cfg(test)]
mod tests;
