use super::*;

#[test]
fn string_emitter_indents_two_spaces_per_level() {
    let mut emitter = StringEmitter::new();
    emitter.emit("do");
    emitter.emit_newline();
    emitter.emit_indent(2);
    emitter.emit("x()");
    assert_eq!(emitter.output(), "do\n    x()");
}

#[test]
fn trim_leaves_single_newline() {
    let mut emitter = StringEmitter::new();
    emitter.emit("return nil");
    emitter.emit_newline();
    emitter.emit_newline();
    emitter.emit_newline();
    emitter.trim_trailing_blank_lines();
    assert_eq!(emitter.output(), "return nil\n");
}

#[test]
fn trim_on_empty_buffer_is_noop() {
    let mut emitter = StringEmitter::new();
    emitter.trim_trailing_blank_lines();
    assert_eq!(emitter.output(), "");
}
