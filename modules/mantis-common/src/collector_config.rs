//! Named collector configurations, loaded from a JSON file keyed by name.
//!
//! ```json
//! {
//!   "nfl_games": {
//!     "id": { "name": "bucket", "value": "nfl_games" },
//!     "sources": ["https://www.pro-football-reference.com/years/{year}/week_{week}.htm"],
//!     "parser": {
//!       "tags": [{ "name": "title", "pattern": "<title>(.*?)</title>" }],
//!       "groups": [{ "name": "", "pattern": "<td data-stat=\"winner\">(?P<winner>[^<]+)</td>" }]
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MantisError;
use crate::types::Tag;

/// Record-level attribute: first match of `pattern`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub name: String,
    pub pattern: String,
}

/// Repeated sub-entity: every match of `pattern` is one attribute sequence
/// built from its named capture groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRule {
    #[serde(default)]
    pub name: String,
    pub pattern: String,
}

/// Uncompiled parsing rules as they appear in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserSpec {
    #[serde(default)]
    pub tags: Vec<TagRule>,
    #[serde(default)]
    pub groups: Vec<GroupRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// `id.value` is the default node-label bucket for every write.
    pub id: Tag,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub parser: ParserSpec,
}

impl CollectorConfig {
    pub fn bucket(&self) -> &str {
        &self.id.value
    }
}

#[derive(Debug, Clone, Default)]
pub struct CollectorConfigs(HashMap<String, CollectorConfig>);

impl CollectorConfigs {
    pub fn load(path: &Path) -> Result<Self, MantisError> {
        let bytes = std::fs::read(path).map_err(|source| MantisError::ConfigNotFound {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_slice(&bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, MantisError> {
        let configs: HashMap<String, CollectorConfig> = serde_json::from_slice(bytes)?;
        Ok(Self(configs))
    }

    /// Look up a config by name. Empty names, unknown names and configs
    /// without sources are all rejected.
    pub fn select(&self, name: &str) -> Result<CollectorConfig, MantisError> {
        match self.0.get(name) {
            Some(config) if !name.is_empty() && !config.sources.is_empty() => Ok(config.clone()),
            _ => Err(MantisError::UnknownConfig {
                name: name.to_string(),
                known: self.names().join(", "),
            }),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
