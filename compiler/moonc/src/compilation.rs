//! Multi-unit compilations and parallel batches of them.

use moon_diagnostic::emitter::DiagnosticEmitter;
use moon_ir::{SemanticModel, SharedInterner, SourceUnit};
use moon_lower::{lower_unit, CompilationContext, CompileOptions, MetadataRegistry};
use rayon::prelude::*;

use crate::CompileError;

/// Luau text of one lowered unit.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompiledUnit {
    pub name: String,
    pub luau: String,
}

/// Result of a compilation: every unit that lowered, and an error for each
/// one that did not.
#[derive(Debug, Default)]
pub struct CompileOutput {
    pub units: Vec<CompiledUnit>,
    pub errors: Vec<CompileError>,
}

impl CompileOutput {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn unit(&self, name: &str) -> Option<&CompiledUnit> {
        self.units.iter().find(|unit| unit.name == name)
    }

    /// Report every error through `emitter`.
    pub fn emit_diagnostics(&self, emitter: &mut dyn DiagnosticEmitter) {
        for error in &self.errors {
            emitter.emit(&error.unit, &error.to_diagnostic());
        }
        emitter.flush();
    }
}

/// One compilation: a set of units resolved against one semantic model.
pub struct Compilation<'a> {
    sema: &'a SemanticModel,
    units: &'a [SourceUnit],
    ctx: CompilationContext,
}

impl<'a> Compilation<'a> {
    pub fn new(
        sema: &'a SemanticModel,
        units: &'a [SourceUnit],
        options: CompileOptions,
        interner: SharedInterner,
    ) -> Self {
        Compilation {
            sema,
            units,
            ctx: CompilationContext::new(options, interner),
        }
    }

    pub fn registry(&self) -> &MetadataRegistry {
        &self.ctx.registry
    }

    /// Collect metadata for every unit, then lower and render each.
    ///
    /// A unit that fails to lower produces no text; the others are still
    /// compiled.
    #[tracing::instrument(level = "debug", skip_all, fields(units = self.units.len()))]
    pub fn compile(&mut self) -> CompileOutput {
        self.ctx.reset();
        for unit in self.units {
            self.ctx.registry.collect_unit(unit, self.sema, &self.ctx.interner);
        }

        let mut output = CompileOutput::default();
        for unit in self.units {
            let name = self.ctx.interner.lookup(unit.name).to_string();
            match lower_unit(unit, self.sema, &self.ctx) {
                Ok(chunk) => {
                    let luau = moon_fmt::render_chunk(&chunk, &*self.ctx.interner);
                    output.units.push(CompiledUnit { name, luau });
                }
                Err(source) => {
                    tracing::debug!(unit = %name, error = %source, "unit failed to lower");
                    output.errors.push(CompileError::new(name, source));
                }
            }
        }
        output
    }
}

/// Inputs of one independent compilation in a batch.
pub struct Job<'a> {
    pub sema: &'a SemanticModel,
    pub units: &'a [SourceUnit],
    pub options: CompileOptions,
}

/// Compile independent jobs in parallel, one context each.
///
/// Results are in job order. Falls back to sequential compilation when the
/// thread pool cannot be created.
pub fn compile_batch(jobs: &[Job<'_>], interner: &SharedInterner) -> Vec<CompileOutput> {
    let run = |job: &Job<'_>| {
        Compilation::new(job.sema, job.units, job.options, interner.clone()).compile()
    };

    rayon::ThreadPoolBuilder::new()
        .stack_size(16 * 1024 * 1024)
        .build_scoped(rayon::ThreadBuilder::run, |pool| {
            pool.install(|| jobs.par_iter().map(run).collect::<Vec<_>>())
        })
        .unwrap_or_else(|e| {
            tracing::warn!("failed to create thread pool ({e}), compiling sequentially");
            jobs.iter().map(run).collect()
        })
}
