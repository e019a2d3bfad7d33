//! Driver configuration from the environment.
//!
//! ```text
//! MOONC_SCRIPT_TYPE=local-script
//! MOONC_MACROS=EnableIteratorHelpers,-SomeOtherFlag
//! ```
//!
//! A flag prefixed with `-` is explicitly disabled. Unknown flags are
//! ignored by [`MacroOptions::from_flags`].

use moon_lower::{CompileOptions, MacroOptions, ParseScriptTypeError, ScriptType};
use thiserror::Error;

pub const SCRIPT_TYPE_VAR: &str = "MOONC_SCRIPT_TYPE";
pub const MACROS_VAR: &str = "MOONC_MACROS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MOONC_SCRIPT_TYPE: {0}")]
    ScriptType(#[from] ParseScriptTypeError),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Config {
    pub options: CompileOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; `lookup` returns `None` for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let script_type = match lookup(SCRIPT_TYPE_VAR) {
            Some(value) if !value.trim().is_empty() => value.parse::<ScriptType>()?,
            _ => ScriptType::default(),
        };
        let macros = lookup(MACROS_VAR)
            .map(|value| parse_macro_flags(&value))
            .unwrap_or_default();
        tracing::debug!(%script_type, ?macros, "loaded configuration");
        Ok(Config {
            options: CompileOptions::default()
                .with_script_type(script_type)
                .with_macros(macros),
        })
    }
}

fn parse_macro_flags(list: &str) -> MacroOptions {
    MacroOptions::from_flags(
        list.split(',')
            .map(str::trim)
            .filter(|flag| !flag.is_empty())
            .map(|flag| match flag.strip_prefix('-') {
                Some(disabled) => (disabled, false),
                None => (flag, true),
            }),
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.options.script_type, ScriptType::Module);
        assert!(!config.options.macros.enable_iterator_helpers);
    }

    #[test]
    fn reads_script_type_and_macros() {
        let config = Config::from_lookup(lookup(&[
            (SCRIPT_TYPE_VAR, "LocalScript"),
            (MACROS_VAR, " EnableIteratorHelpers , Unknown "),
        ]))
        .unwrap();
        assert_eq!(config.options.script_type, ScriptType::LocalScript);
        assert!(config.options.macros.enable_iterator_helpers);
    }

    #[test]
    fn dash_disables_a_flag() {
        let config = Config::from_lookup(lookup(&[(
            MACROS_VAR,
            "EnableIteratorHelpers,-EnableIteratorHelpers",
        )]))
        .unwrap();
        assert!(!config.options.macros.enable_iterator_helpers);
    }

    #[test]
    fn bad_script_type_is_an_error() {
        let err = Config::from_lookup(lookup(&[(SCRIPT_TYPE_VAR, "plugin")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::ScriptType(ParseScriptTypeError("plugin".to_string()))
        );
        assert!(err.to_string().starts_with("MOONC_SCRIPT_TYPE: unknown script type"));
    }
}
