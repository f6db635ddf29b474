//! Configuration for the mode subsystem.
//!
//! The only tunable state this crate reads from configuration is the
//! list-size limit tables. They are loaded from TOML and can be swapped
//! at runtime through [`ModeEngine::rehash`](crate::engine::ModeEngine::rehash)
//! without disturbing in-flight channel state.

mod limits;

pub use limits::{LimitRule, ListLimits, ListLimitsConfig};

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration for the mode subsystem.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModesConfig {
    /// List-size limit tables.
    #[serde(default)]
    pub lists: ListLimitsConfig,
}

impl ModesConfig {
    /// Parse from a TOML document.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gets_defaults() {
        let config = ModesConfig::from_toml("").expect("empty is valid");
        assert_eq!(config.lists.default_limit, 100);
        assert!(config.lists.rules.is_empty());
    }

    #[test]
    fn nested_tables_parse() {
        let config = ModesConfig::from_toml(
            r##"
            [lists]
            default_limit = 40

            [lists.rules]
            b = [{ pattern = "#ops*", limit = 200 }]
            "##,
        )
        .expect("valid document");
        assert_eq!(config.lists.default_limit, 40);
        assert_eq!(config.lists.rules["b"].len(), 1);
        assert_eq!(config.lists.rules["b"][0].limit, 200);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = ModesConfig::from_toml("lists = 3").expect_err("wrong shape");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
