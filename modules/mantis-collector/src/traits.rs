// Trait seams for the collection pipeline.
//
// PageFetcher: one HTTP GET, status + body.
// RecordParser: turns a response body into a Record.
// NodeStore / NodeSession: graph writes. Each persist worker opens its own
//   session and keeps it for its whole lifetime; sessions are never shared.
//
// Mocks for all four live in `testing.rs`.

use anyhow::Result;
use async_trait::async_trait;

use mantis_common::{FetchError, Record, Tag};
use mantis_graph::{GraphClient, NodeWriter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url`. Any HTTP status is `Ok`; only transport failures are `Err`.
    async fn get(&self, url: &str) -> std::result::Result<FetchResponse, FetchError>;
}

pub trait RecordParser: Send + Sync {
    fn parse(&self, body: &str) -> Record;
}

#[async_trait]
pub trait NodeStore: Send + Sync {
    /// Open a write session owned by a single worker.
    async fn session(&self) -> Result<Box<dyn NodeSession>>;
}

#[async_trait]
pub trait NodeSession: Send {
    /// Upsert one node addressed by (label, id).
    async fn put_node(&mut self, label: &str, id: &str, tags: &[Tag]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Neo4j
// ---------------------------------------------------------------------------

/// Session over the driver pool: each write checks out its own connection.
pub struct GraphSession {
    writer: NodeWriter,
}

#[async_trait]
impl NodeStore for GraphClient {
    async fn session(&self) -> Result<Box<dyn NodeSession>> {
        Ok(Box::new(GraphSession {
            writer: self.writer(),
        }))
    }
}

#[async_trait]
impl NodeSession for GraphSession {
    async fn put_node(&mut self, label: &str, id: &str, tags: &[Tag]) -> Result<()> {
        Ok(self.writer.put_node(label, id, tags).await?)
    }
}
