//! Diagnostic system for moonc.
//!
//! Lowering reports failures as [`LowerError`] values. A lowering error is
//! terminal for its unit: the driver converts it into a [`Diagnostic`] with an
//! [`ErrorCode`] and a primary label, and no partial output is written.
//!
//! Best-effort conditions (an annotation that cannot be mapped precisely) are
//! not errors at all; they are logged with `tracing` and lowering continues.

mod diagnostic;
pub mod emitter;
mod error_code;
mod errors;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use errors::{LowerError, LowerResult};
