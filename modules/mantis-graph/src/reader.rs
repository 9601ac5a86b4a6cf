use std::collections::HashMap;

use neo4rs::{query, BoltMap, BoltType};
use tracing::{info, warn};

use crate::GraphClient;

/// Column every driving query must return: a map of parameter name to value.
pub const PARAMS_COLUMN: &str = "params";

/// Read-side wrapper for the graph: runs the query that drives a collection.
#[derive(Clone)]
pub struct ParamReader {
    client: GraphClient,
}

impl ParamReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    /// Run `cypher` and turn each row's `params` map into a parameter row.
    ///
    /// An empty query yields a single empty row so a config without
    /// placeholders still runs once. Rows without a `params` map are skipped.
    pub async fn query_params(
        &self,
        cypher: &str,
    ) -> Result<Vec<HashMap<String, String>>, neo4rs::Error> {
        if cypher.trim().is_empty() {
            return Ok(vec![HashMap::new()]);
        }

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        let mut stream = self.client.graph.execute(query(cypher)).await?;
        while let Some(row) = stream.next().await? {
            match row.get::<BoltMap>(PARAMS_COLUMN) {
                Ok(map) => rows.push(map_to_params(&map)),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, column = PARAMS_COLUMN, "Rows without a params map were skipped");
        }
        info!(rows = rows.len(), "Loaded driving parameters");
        Ok(rows)
    }
}

/// Scalars become strings; nulls and nested values are dropped.
pub(crate) fn map_to_params(map: &BoltMap) -> HashMap<String, String> {
    map.value
        .iter()
        .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key.value.clone(), v)))
        .collect()
}

fn scalar_to_string(value: &BoltType) -> Option<String> {
    match value {
        BoltType::String(s) => Some(s.value.clone()),
        BoltType::Integer(i) => Some(i.value.to_string()),
        BoltType::Float(f) => Some(f.value.to_string()),
        BoltType::Boolean(b) => Some(b.value.to_string()),
        _ => None,
    }
}
