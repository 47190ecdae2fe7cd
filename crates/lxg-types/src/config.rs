use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};

/// Default trailing debounce for text-cell edits.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Minimum allowed debounce (0 commits on the next poll).
pub const MIN_DEBOUNCE_MS: u64 = 0;

/// Maximum allowed debounce.
pub const MAX_DEBOUNCE_MS: u64 = 1000;

/// Configuration for a translation grid.
///
/// ```toml
/// debounce_ms = 150
/// multi_select = true
/// key_separator = "."
/// key_column = "key"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Trailing debounce applied to text edits before they are committed.
    pub debounce_ms: u64,
    /// When `true`, plain clicks toggle rows instead of replacing the
    /// selection (checkbox-style lists).
    pub multi_select: bool,
    /// Separator between the segments of a translation key.
    pub key_separator: String,
    /// Name of the column that holds each row's translation key.
    pub key_column: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            multi_select: false,
            key_separator: ".".to_string(),
            key_column: "key".to_string(),
        }
    }
}

impl GridConfig {
    /// Parse and validate a TOML document. Missing fields take defaults.
    pub fn from_toml_str(s: &str) -> TypeResult<Self> {
        let config: GridConfig =
            toml::from_str(s).map_err(|e| TypeError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> TypeResult<String> {
        toml::to_string(self).map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Check field ranges and non-empty names.
    pub fn validate(&self) -> TypeResult<()> {
        if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&self.debounce_ms) {
            return Err(TypeError::OutOfRange {
                field: "debounce_ms",
                value: self.debounce_ms,
                min: MIN_DEBOUNCE_MS,
                max: MAX_DEBOUNCE_MS,
            });
        }
        if self.key_separator.is_empty() {
            return Err(TypeError::InvalidConfig(
                "key_separator must not be empty".into(),
            ));
        }
        if self.key_column.is_empty() {
            return Err(TypeError::InvalidConfig("key_column must not be empty".into()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
