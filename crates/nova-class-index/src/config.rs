use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::merge::MergePolicy;

/// Build-time settings for an [`IndexBuilder`](crate::IndexBuilder).
///
/// ```toml
/// track_users = false
/// merge_policy = "replace"
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Maintain the referenced-name -> referencing-units graph.
    #[serde(default = "default_track_users")]
    pub track_users: bool,
    /// How `merge` resolves two different units with the same name.
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

fn default_track_users() -> bool {
    true
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            track_users: default_track_users(),
            merge_policy: MergePolicy::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The default `Display` quotes the offending source line; keep only the message.
        ConfigError::Toml(err.message().to_string())
    }
}

impl IndexConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
