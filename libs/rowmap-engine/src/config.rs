use serde::Deserialize;

use crate::error::MapError;

/// Mapper configuration, parsed from TOML.
///
/// ```toml
/// multi_row = "fail"
/// json_text = true
/// max_depth = 16
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapperConfig {
    /// What `query` does when a single destination receives a second row.
    #[serde(default)]
    pub multi_row: MultiRowPolicy,

    /// Parse text columns as JSON documents when the destination is a
    /// record or a sequence.
    #[serde(default = "default_json_text")]
    pub json_text: bool,

    /// Maximum nesting of nested documents.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_json_text() -> bool {
    true
}

fn default_max_depth() -> usize {
    32
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            multi_row: MultiRowPolicy::default(),
            json_text: default_json_text(),
            max_depth: default_max_depth(),
        }
    }
}

/// Multi-row policy for single (non-sequence) destinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiRowPolicy {
    /// Overwrite with every row; the last one wins.
    #[default]
    KeepLast,
    /// Fail with `TooManyRows` on the second row.
    Fail,
}

impl MapperConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, MapError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| MapError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, MapError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| MapError::Config(e.to_string()))?;
        if config.max_depth == 0 {
            return Err(MapError::Config("max_depth must be at least 1".into()));
        }
        Ok(config)
    }
}
