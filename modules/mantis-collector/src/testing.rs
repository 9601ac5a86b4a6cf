// Test mocks for the collection pipeline.
//
// Three mocks matching the trait boundaries:
// - MockFetcher (PageFetcher): HashMap-based URL→(status, body), records calls
// - FixedParser (RecordParser): HashMap-based body→Record
// - MockNodeStore (NodeStore): in-memory write log, per-label failures,
//   counts sessions opened
//
// Plus helpers for building work items and records.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use mantis_common::{FetchError, Group, Record, Tag, WorkItem};

use crate::pipeline::NodeWrite;
use crate::traits::{FetchResponse, NodeSession, NodeStore, PageFetcher, RecordParser};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Returns a transport error for unregistered URLs.
/// Builder pattern: `.on_ok()`, `.on_status()`.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, FetchResponse>,
    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_ok(self, url: &str, body: &str) -> Self {
        self.on_status(url, 200, body)
    }

    pub fn on_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            FetchResponse {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    /// URLs requested so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport(format!("MockFetcher: no response for {url}")))
    }
}

// ---------------------------------------------------------------------------
// FixedParser
// ---------------------------------------------------------------------------

/// Unknown bodies parse to an empty record.
#[derive(Default)]
pub struct FixedParser {
    records: HashMap<String, Record>,
}

impl FixedParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_body(mut self, body: &str, record: Record) -> Self {
        self.records.insert(body.to_string(), record);
        self
    }
}

impl RecordParser for FixedParser {
    fn parse(&self, body: &str) -> Record {
        self.records.get(body).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// MockNodeStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    writes: Mutex<Vec<NodeWrite>>,
    failing_labels: HashSet<String>,
    sessions: AtomicUsize,
    live_sessions: AtomicUsize,
    max_live_sessions: AtomicUsize,
}

/// In-memory graph store. Every session writes into the same log.
#[derive(Default)]
pub struct MockNodeStore {
    state: Arc<StoreState>,
    refuse_sessions: bool,
}

impl MockNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes to `label` fail (after being attempted).
    pub fn failing_label(mut self, label: &str) -> Self {
        Arc::get_mut(&mut self.state)
            .expect("configure before sharing")
            .failing_labels
            .insert(label.to_string());
        self
    }

    /// `session()` always fails.
    pub fn refusing_sessions(mut self) -> Self {
        self.refuse_sessions = true;
        self
    }

    /// Every write attempted, including failed ones.
    pub fn writes(&self) -> Vec<NodeWrite> {
        self.state.writes.lock().unwrap().clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.state.sessions.load(Ordering::SeqCst)
    }

    /// Most sessions alive at the same time.
    pub fn max_live_sessions(&self) -> usize {
        self.state.max_live_sessions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NodeStore for MockNodeStore {
    async fn session(&self) -> Result<Box<dyn NodeSession>> {
        if self.refuse_sessions {
            bail!("MockNodeStore: sessions refused");
        }
        self.state.sessions.fetch_add(1, Ordering::SeqCst);
        let live = self.state.live_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_live_sessions.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(MockSession {
            state: self.state.clone(),
        }))
    }
}

struct MockSession {
    state: Arc<StoreState>,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.state.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl NodeSession for MockSession {
    async fn put_node(&mut self, label: &str, id: &str, tags: &[Tag]) -> Result<()> {
        self.state.writes.lock().unwrap().push(NodeWrite {
            label: label.to_string(),
            id: id.to_string(),
            tags: tags.to_vec(),
        });
        if self.state.failing_labels.contains(label) {
            bail!("MockNodeStore: write to {label} refused");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Work item with a single URL, bucket `games`, and `label` as its identity.
pub fn work_item(url: &str, label: &str) -> WorkItem {
    WorkItem::new(
        vec![url.to_string()],
        label.to_string(),
        "games".to_string(),
        params(&[("week", label)]),
    )
}

pub fn tags(pairs: &[(&str, &str)]) -> Vec<Tag> {
    pairs.iter().map(|(k, v)| Tag::new(*k, *v)).collect()
}

pub fn group(name: &str, rows: Vec<Vec<Tag>>) -> Group {
    Group {
        name: name.to_string(),
        rows,
    }
}

/// Record with two tags and no groups: persists as one node.
pub fn flat_record() -> Record {
    Record {
        tags: tags(&[("season", "2020"), ("source", "test")]),
        groups: vec![],
    }
}
