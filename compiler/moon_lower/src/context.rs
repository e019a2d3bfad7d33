//! Compilation options and the per-compilation context.

use std::fmt;
use std::str::FromStr;

use moon_ir::SharedInterner;

use crate::metadata::MetadataRegistry;

/// How the emitted chunk is loaded by the host.
///
/// Only the chunk wrapper depends on it: module scripts end with an exports
/// table, plain and local scripts run for effect.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub enum ScriptType {
    #[default]
    Module,
    Script,
    LocalScript,
}

impl ScriptType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScriptType::Module => "module",
            ScriptType::Script => "script",
            ScriptType::LocalScript => "local-script",
        }
    }

    pub fn returns_exports(self) -> bool {
        matches!(self, ScriptType::Module)
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised script type name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseScriptTypeError(pub String);

impl fmt::Display for ParseScriptTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown script type `{}` (expected module, script or local-script)",
            self.0
        )
    }
}

impl std::error::Error for ParseScriptTypeError {}

impl FromStr for ScriptType {
    type Err = ParseScriptTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "module" | "modulescript" => Ok(ScriptType::Module),
            "script" | "server" => Ok(ScriptType::Script),
            "local-script" | "localscript" | "client" => Ok(ScriptType::LocalScript),
            _ => Err(ParseScriptTypeError(s.to_string())),
        }
    }
}

/// Opt-in lowering variants.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct MacroOptions {
    /// `foreach` over an opaque enumerable goes through `CS.iter`, and
    /// `ToArray`/`ToList` on one through `CS.collect`.
    pub enable_iterator_helpers: bool,
}

impl MacroOptions {
    pub const ENABLE_ITERATOR_HELPERS: &'static str = "EnableIteratorHelpers";

    /// Build from `(flag, enabled)` pairs. Unknown flags are ignored.
    pub fn from_flags<'f>(flags: impl IntoIterator<Item = (&'f str, bool)>) -> Self {
        let mut options = MacroOptions::default();
        for (flag, enabled) in flags {
            if flag.eq_ignore_ascii_case(Self::ENABLE_ITERATOR_HELPERS) {
                options.enable_iterator_helpers = enabled;
            } else {
                tracing::debug!(flag, "ignoring unknown macro flag");
            }
        }
        options
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct CompileOptions {
    pub script_type: ScriptType,
    pub macros: MacroOptions,
}

impl CompileOptions {
    #[must_use]
    pub fn with_script_type(mut self, script_type: ScriptType) -> Self {
        self.script_type = script_type;
        self
    }

    #[must_use]
    pub fn with_macros(mut self, macros: MacroOptions) -> Self {
        self.macros = macros;
        self
    }
}

/// State shared by every unit of one compilation.
///
/// Each independent compilation owns its own context (and registry); only
/// the interner may be shared across threads.
pub struct CompilationContext {
    pub options: CompileOptions,
    pub interner: SharedInterner,
    pub registry: MetadataRegistry,
}

impl CompilationContext {
    pub fn new(options: CompileOptions, interner: SharedInterner) -> Self {
        CompilationContext {
            options,
            interner,
            registry: MetadataRegistry::new(),
        }
    }

    /// Forget everything recorded by a previous compilation.
    pub fn reset(&mut self) {
        self.registry.reset();
    }
}
