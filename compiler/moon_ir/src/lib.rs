//! moonc IR - shared data structures for the moonc compiler.
//!
//! This crate holds everything the lowering pipeline reads or produces:
//! - Spans and interned names
//! - The Input-Language source tree (`ast`), stored flat in a [`SourceArena`]
//! - The semantic model (`sema`) the front end resolved for that tree
//! - The Luau target AST (`luau`) and its parallel `TypeInfo` tree
//!
//! # Design Philosophy
//!
//! - **Intern names**: identifiers and string literals become `Name(u32)`
//! - **Flat source tree**: source nodes reference children by `ExprId`/`StmtId`
//! - **Owned target tree**: the Luau AST owns its children so that cloning a
//!   subtree never aliases the original
//!
//! The source side is read-only to the compiler core. The target side is built
//! by `moon_lower` and printed by `moon_fmt`.

pub mod arena;
pub mod ast;
pub mod builder;
mod ids;
mod interner;
pub mod luau;
mod name;
pub mod sema;
mod span;

pub use arena::{SourceArena, SourceUnit};
pub use builder::AstBuilder;
pub use ids::{ExprId, ExprRange, PatternId, StmtId, StmtRange};
pub use interner::{SharedInterner, StringInterner, StringLookup};
pub use name::Name;
pub use sema::{SemanticModel, SymbolId, TypeId};
pub use span::Span;
