pub mod collector_config;
pub mod config;
pub mod error;
pub mod types;

pub use collector_config::{CollectorConfig, CollectorConfigs, GroupRule, ParserSpec, TagRule};
pub use config::AppConfig;
pub use error::{FetchError, MantisError, PersistError};
pub use types::*;
