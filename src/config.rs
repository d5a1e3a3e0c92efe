use crate::error::ConfigError;

use serde::{Deserialize, Serialize};
use std::fs;

/// Router configuration.
///
/// Every field has a default, so a configuration file only needs to name the
/// fields it changes:
///
/// ```rust
/// let config = traject::RouterConfig::from_toml(r#"link_prefix = "/app""#).unwrap();
/// assert_eq!(config.reserved_marker, '+');
/// assert_eq!(config.link_prefix, "/app");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// A path segment starting with this character names a view and stops
    /// path resolution.
    pub reserved_marker: char,

    /// Prepended to every generated link, e.g. the mount point of the
    /// application.
    pub link_prefix: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            reserved_marker: '+',
            link_prefix: String::new(),
        }
    }
}

impl RouterConfig {
    /// Parses and validates a TOML configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML configuration file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Rejects markers that could be part of a pattern or a path separator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.reserved_marker {
            '/' | '{' | '}' | '.' | '?' => Err(ConfigError::InvalidMarker(self.reserved_marker)),
            c if c.is_whitespace() || c.is_alphanumeric() => Err(ConfigError::InvalidMarker(c)),
            _ => Ok(()),
        }
    }
}
