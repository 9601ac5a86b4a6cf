use neo4rs::{query, BoltMap, BoltString, BoltType};
use tracing::debug;

use mantis_common::Tag;

use crate::GraphClient;

/// Write-side wrapper for the graph. One node per call, upserted by identifier.
#[derive(Clone)]
pub struct NodeWriter {
    client: GraphClient,
}

impl NodeWriter {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Upsert node `(:label {label: id})` and merge `tags` into its properties.
    /// Later tags with the same name overwrite earlier ones.
    pub async fn put_node(&self, label: &str, id: &str, tags: &[Tag]) -> Result<(), neo4rs::Error> {
        let q = query(&put_node_cypher(label))
            .param("id", id)
            .param("properties", BoltType::Map(tags_to_map(tags)));

        self.client.graph.run(q).await?;
        debug!(label, id, properties = tags.len(), "Node upserted");
        Ok(())
    }
}

/// Labels cannot be query parameters, so the label is inlined as a quoted
/// identifier.
pub(crate) fn put_node_cypher(label: &str) -> String {
    format!(
        "MERGE (n:{} {{label: $id}}) SET n += $properties",
        quote_identifier(label)
    )
}

/// Backtick-quote a Cypher identifier, doubling embedded backticks.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn tags_to_map(tags: &[Tag]) -> BoltMap {
    BoltMap::from_iter(tags.iter().map(|tag| {
        (
            BoltString::from(tag.name.as_str()),
            BoltType::String(BoltString::from(tag.value.as_str())),
        )
    }))
}
