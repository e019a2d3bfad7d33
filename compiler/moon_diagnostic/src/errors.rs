//! Terminal lowering failures.

use moon_ir::Span;
use thiserror::Error;

use crate::{Diagnostic, ErrorCode};

pub type LowerResult<T> = Result<T, LowerError>;

/// A construct the lowering cannot translate. Fails the whole unit.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LowerError {
    /// Input the analyzer should have rejected (second catch clause, etc.).
    #[error("{construct} is not supported")]
    Unsupported { construct: String, span: Span },

    /// A switch with no default or discard arm.
    #[error("switch does not handle every value; add a `default` or `_` arm")]
    NonExhaustiveSwitch { span: Span },

    /// The source tree violates an invariant the front end guarantees.
    #[error("malformed source tree: {detail}")]
    InvalidTree { detail: String, span: Span },
}

impl LowerError {
    pub fn unsupported(construct: impl Into<String>, span: Span) -> Self {
        LowerError::Unsupported {
            construct: construct.into(),
            span,
        }
    }

    pub fn invalid_tree(detail: impl Into<String>, span: Span) -> Self {
        LowerError::InvalidTree {
            detail: detail.into(),
            span,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LowerError::Unsupported { .. } => ErrorCode::E1001,
            LowerError::NonExhaustiveSwitch { .. } => ErrorCode::E1002,
            LowerError::InvalidTree { .. } => ErrorCode::E9001,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            LowerError::Unsupported { span, .. }
            | LowerError::NonExhaustiveSwitch { span }
            | LowerError::InvalidTree { span, .. } => *span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let label = match self {
            LowerError::Unsupported { .. } => "not supported here",
            LowerError::NonExhaustiveSwitch { .. } => "no arm matches the remaining values",
            LowerError::InvalidTree { .. } => "while lowering this node",
        };
        let diag = Diagnostic::error(self.code())
            .with_message(self.to_string())
            .with_label(self.span(), label);
        if self.code().is_internal_error() {
            diag.with_note("this is a bug in the front end that produced the tree")
        } else {
            diag
        }
    }
}

impl From<LowerError> for Diagnostic {
    fn from(err: LowerError) -> Self {
        err.to_diagnostic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_names_the_construct() {
        let err = LowerError::unsupported("multiple catch clauses", Span::new(4, 9));
        assert_eq!(err.to_string(), "multiple catch clauses is not supported");
        assert_eq!(err.code(), ErrorCode::E1001);
        assert_eq!(err.span(), Span::new(4, 9));
    }

    #[test]
    fn diagnostic_carries_primary_label() {
        let diag = LowerError::NonExhaustiveSwitch {
            span: Span::new(1, 2),
        }
        .to_diagnostic();
        assert_eq!(diag.code, ErrorCode::E1002);
        assert_eq!(diag.primary_span(), Some(Span::new(1, 2)));
        assert!(diag.notes.is_empty());
    }

    #[test]
    fn invalid_tree_is_reported_as_internal() {
        let diag: Diagnostic = LowerError::invalid_tree("dangling id", Span::DUMMY).into();
        assert_eq!(diag.code, ErrorCode::E9001);
        assert_eq!(diag.notes.len(), 1);
    }
}
