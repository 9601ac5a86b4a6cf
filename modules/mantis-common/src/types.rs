use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FetchError, PersistError};

// --- Attributes ---

/// A single (name, value) attribute. Everything written to the graph is a string pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named sub-collection of a record. Each entry in `rows` is one discovered
/// sub-entity (e.g. one table row in the response).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub rows: Vec<Vec<Tag>>,
}

/// Parser output for one fetched response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub tags: Vec<Tag>,
    pub groups: Vec<Group>,
}

impl Record {
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.groups.is_empty()
    }
}

// --- Pipeline unit ---

/// One unit of pipeline work, derived from one driving parameter row.
///
/// Identity (`urls`, `label`, `bucket`, `properties`) is fixed at construction.
/// The fetch stage fills `record`/`fetch_error`, the persist stage fills
/// `persist_error`; neither stage touches the other's field.
#[derive(Debug, Clone)]
pub struct WorkItem {
    urls: Vec<String>,
    label: String,
    bucket: String,
    properties: HashMap<String, String>,
    pub record: Option<Record>,
    pub fetch_error: Option<FetchError>,
    pub persist_error: Option<PersistError>,
}

impl WorkItem {
    pub fn new(
        urls: Vec<String>,
        label: String,
        bucket: String,
        properties: HashMap<String, String>,
    ) -> Self {
        Self {
            urls,
            label,
            bucket,
            properties,
            record: None,
            fetch_error: None,
            persist_error: None,
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Fetch succeeded (or was never attempted).
    pub fn fetch_ok(&self) -> bool {
        self.fetch_error.is_none()
    }

    pub fn persist_ok(&self) -> bool {
        self.persist_error.is_none()
    }
}
