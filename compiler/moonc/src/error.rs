use moon_diagnostic::{Diagnostic, LowerError};
use thiserror::Error;

/// A unit that failed to lower. Nothing is emitted for it.
#[derive(Debug, Error)]
#[error("failed to lower `{unit}`: {source}")]
pub struct CompileError {
    pub unit: String,
    #[source]
    pub source: LowerError,
}

impl CompileError {
    pub fn new(unit: impl Into<String>, source: LowerError) -> Self {
        CompileError {
            unit: unit.into(),
            source,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        self.source.to_diagnostic()
    }
}
