//! Lowering from the typed source tree to the Luau target AST.
//!
//! The pipeline for one unit:
//!
//! 1. [`MetadataRegistry::collect_unit`] records every type of every unit
//!    (mangled names, generator methods, attributes) up front
//! 2. [`lower_unit`] walks the unit's types, then its top-level statements,
//!    producing a [`Chunk`](moon_ir::luau::Chunk)
//! 3. `moon_fmt` prints the chunk
//!
//! # Modules
//!
//! - [`types`]: the Type Mapper (`TypeId` to `TypeInfo`)
//! - [`metadata`]: the Symbol Metadata Registry
//! - `lower`: expressions and statements
//! - `patterns`: pattern matching, `is` and `switch`
//! - `control_flow`: try/catch/finally, `using`, generators
//! - `declarations`: classes, structs, enums and interfaces

pub mod context;
mod control_flow;
mod declarations;
mod lower;
pub mod metadata;
mod patterns;
mod stack;
pub mod types;
mod unit;

#[cfg(test)]
mod test_support;

pub use context::{CompilationContext, CompileOptions, MacroOptions, ParseScriptTypeError, ScriptType};
pub use lower::Lowered;
pub use metadata::{MetadataRegistry, SymbolMetadata};
pub use types::TypeMapper;
pub use unit::lower_unit;
