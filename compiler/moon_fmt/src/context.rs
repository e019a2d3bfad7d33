//! Render context: the emitter plus the current indentation level.

use crate::emitter::{Emitter, StringEmitter};

/// Spaces per indentation level.
pub const INDENT_WIDTH: usize = 2;

pub struct RenderContext<E: Emitter = StringEmitter> {
    emitter: E,
    indent_level: usize,
}

impl RenderContext<StringEmitter> {
    pub fn new() -> Self {
        Self::with_emitter(StringEmitter::new())
    }

    /// Finish rendering: exactly one trailing newline, none for empty output.
    pub fn finish(self) -> String {
        let mut emitter = self.emitter;
        emitter.trim_trailing_blank_lines();
        emitter.output()
    }

    /// Take the text without normalising line endings (expression output).
    pub fn into_raw(self) -> String {
        self.emitter.output()
    }
}

impl Default for RenderContext<StringEmitter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Emitter> RenderContext<E> {
    pub fn with_emitter(emitter: E) -> Self {
        RenderContext {
            emitter,
            indent_level: 0,
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level
    }

    pub fn emit(&mut self, text: &str) {
        self.emitter.emit(text);
    }

    /// Start a new line at the current indentation.
    pub fn new_line(&mut self) {
        self.emitter.emit_newline();
        self.emitter.emit_indent(self.indent_level);
    }

    /// Terminate the current line without indenting the next one.
    pub fn end_line(&mut self) {
        self.emitter.emit_newline();
    }

    pub fn indent(&mut self) {
        self.indent_level += 1;
    }

    pub fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }
}
