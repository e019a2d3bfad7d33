//! Plain-text diagnostic output.
//!
//! ```text
//! error[E1001]: multiple catch clauses is not supported
//!   --> Shop.cs @ 120..184: not supported here
//!   = note: ...
//! ```

use std::io::{self, Write};

use crate::{Diagnostic, Severity};

/// Sink for diagnostics.
pub trait DiagnosticEmitter {
    /// Emit one diagnostic raised while lowering `unit`.
    fn emit(&mut self, unit: &str, diagnostic: &Diagnostic);

    fn emit_all(&mut self, unit: &str, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(unit, diag);
        }
    }

    fn flush(&mut self);
}

/// Writes uncoloured text; used for stderr and for test snapshots.
pub struct TextEmitter<W: Write> {
    writer: W,
    errors: usize,
    warnings: usize,
}

impl<W: Write> TextEmitter<W> {
    pub fn new(writer: W) -> Self {
        TextEmitter {
            writer,
            errors: 0,
            warnings: 0,
        }
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// `error: aborting due to 2 previous errors`; nothing when clean.
    pub fn emit_summary(&mut self) {
        match (self.errors, self.warnings) {
            (0, 0) => {}
            (0, w) => {
                let _ = writeln!(self.writer, "warning: {w} warning{} emitted", plural_s(w));
            }
            (1, _) => {
                let _ = writeln!(self.writer, "error: aborting due to previous error");
            }
            (e, _) => {
                let _ = writeln!(self.writer, "error: aborting due to {e} previous errors");
            }
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl TextEmitter<io::Stderr> {
    pub fn stderr() -> Self {
        TextEmitter::new(io::stderr())
    }
}

#[inline]
fn plural_s(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

impl<W: Write> DiagnosticEmitter for TextEmitter<W> {
    fn emit(&mut self, unit: &str, diagnostic: &Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        let _ = writeln!(self.writer, "{diagnostic}");
        for label in &diagnostic.labels {
            let marker = if label.is_primary { "-->" } else { "   " };
            let _ = writeln!(
                self.writer,
                "  {marker} {unit} @ {}: {}",
                label.span, label.message
            );
        }
        for note in &diagnostic.notes {
            let _ = writeln!(self.writer, "  = note: {note}");
        }
        let _ = writeln!(self.writer);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}
