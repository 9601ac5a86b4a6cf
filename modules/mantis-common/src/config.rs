use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::MantisError;

const DEFAULT_NEO4J_PORT: &str = "7687";

/// Process configuration loaded once from environment variables at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Neo4j
    pub neo4j_host: String,
    pub neo4j_port: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Filesystem
    pub base_path: PathBuf,
    pub log_file: PathBuf,
    pub collector_config: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, MantisError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` is this over `std::env`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MantisError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| MantisError::Config(format!("{key} environment variable is required")))
        };

        let base_path = PathBuf::from(lookup("BASE_PATH").unwrap_or_else(|| ".".to_string()));
        let log_file = lookup("MANTIS_LOG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_path.join("run.log"));
        let collector_config = lookup("MANTIS_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| base_path.join("config/collector/collector.json"));

        Ok(Self {
            neo4j_host: required("NEO4J_HOST")?,
            neo4j_port: lookup("NEO4J_PORT").unwrap_or_else(|| DEFAULT_NEO4J_PORT.to_string()),
            neo4j_user: required("NEO4J_USERNAME")?,
            neo4j_password: required("NEO4J_PASSWORD")?,
            base_path,
            log_file,
            collector_config,
        })
    }

    pub fn neo4j_uri(&self) -> String {
        format!("bolt://{}:{}", self.neo4j_host, self.neo4j_port)
    }

    /// Log the loaded configuration without credentials.
    pub fn log_redacted(&self) {
        info!(
            neo4j_uri = self.neo4j_uri().as_str(),
            neo4j_user = self.neo4j_user.as_str(),
            base_path = %self.base_path.display(),
            log_file = %self.log_file.display(),
            collector_config = %self.collector_config.display(),
            "Loaded config"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn loads_with_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("NEO4J_HOST", "db"),
            ("NEO4J_USERNAME", "neo4j"),
            ("NEO4J_PASSWORD", "secret"),
            ("BASE_PATH", "/srv/mantis"),
        ]))
        .unwrap();

        assert_eq!(config.neo4j_uri(), "bolt://db:7687");
        assert_eq!(config.log_file, PathBuf::from("/srv/mantis/run.log"));
        assert_eq!(
            config.collector_config,
            PathBuf::from("/srv/mantis/config/collector/collector.json")
        );
    }

    #[test]
    fn explicit_paths_win() {
        let config = AppConfig::from_lookup(lookup(&[
            ("NEO4J_HOST", "db"),
            ("NEO4J_PORT", "7688"),
            ("NEO4J_USERNAME", "neo4j"),
            ("NEO4J_PASSWORD", "secret"),
            ("MANTIS_LOG_FILE", "/tmp/mantis.log"),
            ("MANTIS_CONFIG", "/etc/mantis/nfl.json"),
        ]))
        .unwrap();

        assert_eq!(config.neo4j_uri(), "bolt://db:7688");
        assert_eq!(config.log_file, PathBuf::from("/tmp/mantis.log"));
        assert_eq!(config.collector_config, PathBuf::from("/etc/mantis/nfl.json"));
    }

    #[test]
    fn missing_credentials_is_an_error() {
        let err = AppConfig::from_lookup(lookup(&[("NEO4J_HOST", "db")])).unwrap_err();
        assert!(matches!(err, MantisError::Config(msg) if msg.contains("NEO4J_USERNAME")));
    }
}
