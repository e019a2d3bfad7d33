//! Error codes for moonc diagnostics.
//!
//! Format: E#### where the first digit is the phase:
//! - E1xxx: lowering (constructs the core cannot translate)
//! - E9xxx: internal errors (malformed input trees)

use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    /// Construct not supported by the lowering
    E1001,
    /// Switch expression without a default or discard arm
    E1002,
    /// Malformed source tree (ICE)
    E9001,
}

impl ErrorCode {
    pub const ALL: &'static [ErrorCode] = &[ErrorCode::E1001, ErrorCode::E1002, ErrorCode::E9001];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line summary for `--explain`-style listings.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "construct is not supported by the Luau lowering",
            ErrorCode::E1002 => "switch is not exhaustive",
            ErrorCode::E9001 => "internal error: malformed source tree",
        }
    }

    pub fn is_lowering_error(&self) -> bool {
        matches!(self, ErrorCode::E1001 | ErrorCode::E1002)
    }

    pub fn is_internal_error(&self) -> bool {
        matches!(self, ErrorCode::E9001)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
