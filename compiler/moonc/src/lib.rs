//! The moonc compilation driver.
//!
//! A [`Compilation`] owns one [`CompilationContext`]: it records every unit
//! in the metadata registry, then lowers and renders each unit to Luau text.
//! Independent compilations share nothing but the string interner and can
//! run side by side with [`compile_batch`].
//!
//! ```text
//! SourceUnit ──collect──▶ MetadataRegistry
//!      │                        │
//!      └────────lower_unit──────┴──▶ Chunk ──render_chunk──▶ Luau text
//! ```
//!
//! Enable logging with `RUST_LOG=moon_lower=debug` after [`init_tracing`].

mod compilation;
mod config;
mod error;

use std::sync::Once;

pub use compilation::{compile_batch, CompileOutput, CompiledUnit, Compilation, Job};
pub use config::{Config, ConfigError, MACROS_VAR, SCRIPT_TYPE_VAR};
pub use error::CompileError;
pub use moon_lower::{CompilationContext, CompileOptions, MacroOptions, ScriptType};

static TRACING_INIT: Once = Once::new();

/// Install the `tracing` subscriber.
///
/// Safe to call more than once; only the first call does anything, and only
/// when `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
