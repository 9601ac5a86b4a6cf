use neo4rs::{ConfigBuilder, Graph};
use tracing::info;

use mantis_common::{AppConfig, MantisError};

use crate::{NodeWriter, ParamReader};

/// Upper bound on pooled bolt connections shared by all writers.
const MAX_CONNECTIONS: usize = 16;
const FETCH_SIZE: usize = 500;

/// Pooled handle to Neo4j.
///
/// `Graph` is a connection pool: clones share it, and every query checks a
/// connection out for its own duration, so concurrent writers never share one.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, MantisError> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(FETCH_SIZE)
            .max_connections(MAX_CONNECTIONS)
            .build()?;
        let graph = Graph::connect(config).await?;
        info!(uri, max_connections = MAX_CONNECTIONS, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Connect using the bolt URI and credentials from the process config.
    pub async fn from_config(config: &AppConfig) -> Result<Self, MantisError> {
        Self::connect(&config.neo4j_uri(), &config.neo4j_user, &config.neo4j_password).await
    }

    pub fn writer(&self) -> NodeWriter {
        NodeWriter::new(self.clone())
    }

    pub fn reader(&self) -> ParamReader {
        ParamReader::new(self.clone())
    }

    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
