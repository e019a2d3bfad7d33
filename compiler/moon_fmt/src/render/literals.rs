//! Number and string literal spelling.

use std::fmt::Write;

/// Shortest Luau spelling of a number literal.
#[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
pub(super) fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "0 / 0".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "math.huge" } else { "-math.huge" }.to_string();
    }
    if value.trunc() == value && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    format!("{value}")
}

/// Double-quoted string literal.
pub(super) fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            _ => push_escaped(&mut out, c),
        }
    }
    out.push('"');
    out
}

/// Text segment of a backtick string.
pub(super) fn escape_interpolated(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '`' => out.push_str("\\`"),
            '{' => out.push_str("\\{"),
            _ => push_escaped(&mut out, c),
        }
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => {
            let _ = write!(out, "\\u{{{:x}}}", c as u32);
        }
        c => out.push(c),
    }
}
