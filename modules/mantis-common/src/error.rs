use thiserror::Error;

#[derive(Error, Debug)]
pub enum MantisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No such config file: {path}")]
    ConfigNotFound {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config name: {name:?} (known: {known})")]
    UnknownConfig { name: String, known: String },

    #[error("Parser error: {0}")]
    Parser(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<serde_json::Error> for MantisError {
    fn from(err: serde_json::Error) -> Self {
        MantisError::Config(err.to_string())
    }
}

impl From<neo4rs::Error> for MantisError {
    fn from(err: neo4rs::Error) -> Self {
        MantisError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for MantisError {
    fn from(err: reqwest::Error) -> Self {
        MantisError::Http(err.to_string())
    }
}

/// Per-item fetch failure. Recorded on the work item, never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("unexpected status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("rate limited (429)")]
    RateLimited,
}

impl FetchError {
    /// Status code to report in logs; transport failures never got one.
    pub fn code(&self) -> u16 {
        match self {
            FetchError::Status(code) => *code,
            FetchError::RateLimited => 429,
            FetchError::Transport(_) => 0,
        }
    }
}

/// Per-item write failure. Last error observed for the item wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("write to {label}/{id} failed: {message}")]
pub struct PersistError {
    pub label: String,
    pub id: String,
    pub message: String,
}
