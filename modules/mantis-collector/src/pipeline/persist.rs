use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use mantis_common::{PersistError, Tag, WorkItem};

use super::{forward, next_item, SharedReceiver};
use crate::traits::{NodeSession, NodeStore};

/// One node upsert derived from a work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeWrite {
    pub label: String,
    pub id: String,
    pub tags: Vec<Tag>,
}

/// Map a fetched item to the node writes it produces.
///
/// - With groups: one write per row, labelled `bucket` (or `bucket_<group>`
///   for a named group) with id `<label>_<n>`, `n` counting rows from 1
///   within the group.
/// - Without groups: a single `bucket`/`label` write, but only when the
///   record carries more than one tag.
/// - Items that failed to fetch, or have no record, produce nothing.
pub fn plan_writes(item: &WorkItem) -> Vec<NodeWrite> {
    if !item.fetch_ok() {
        return Vec::new();
    }
    let Some(record) = &item.record else {
        return Vec::new();
    };

    let base: Vec<Tag> = item
        .properties()
        .iter()
        .map(|(name, value)| Tag::new(name.as_str(), value.as_str()))
        .collect();

    if record.groups.is_empty() {
        if record.tags.len() <= 1 {
            return Vec::new();
        }
        return vec![NodeWrite {
            label: item.bucket().to_string(),
            id: item.label().to_string(),
            tags: [base.as_slice(), record.tags.as_slice()].concat(),
        }];
    }

    let mut writes = Vec::new();
    for group in &record.groups {
        let label = if group.name.is_empty() {
            item.bucket().to_string()
        } else {
            format!("{}_{}", item.bucket(), group.name)
        };
        for (n, row) in group.rows.iter().enumerate() {
            writes.push(NodeWrite {
                label: label.clone(),
                id: format!("{}_{}", item.label(), n + 1),
                tags: [base.as_slice(), record.tags.as_slice(), row.as_slice()].concat(),
            });
        }
    }
    writes
}

/// Run every planned write for `item` through `session`.
///
/// A failed write marks the item and moves on to the next write; the last
/// failure observed is the one kept.
pub async fn persist_item(item: &mut WorkItem, session: &mut dyn NodeSession) {
    for write in plan_writes(item) {
        if let Err(e) = session.put_node(&write.label, &write.id, &write.tags).await {
            error!(label = write.label.as_str(), id = write.id.as_str(), error = %e, "PutNode");
            item.persist_error = Some(PersistError {
                label: write.label,
                id: write.id,
                message: e.to_string(),
            });
        }
    }
}

/// Persist worker: opens its own session, then drains `input` into `output`.
///
/// If no session can be opened, items that need writes are marked failed
/// and still forwarded, so the orchestrator's drain count stays exact.
pub(crate) async fn persist_worker(
    input: SharedReceiver,
    output: mpsc::Sender<WorkItem>,
    store: Arc<dyn NodeStore>,
    cancel: CancellationToken,
) {
    let mut session = match store.session().await {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(error = %e, "Failed to open graph session");
            None
        }
    };

    while let Some(mut item) = next_item(&input, &cancel).await {
        match session.as_mut() {
            Some(session) => persist_item(&mut item, &mut **session).await,
            None => {
                if let Some(write) = plan_writes(&item).into_iter().next() {
                    item.persist_error = Some(PersistError {
                        label: write.label,
                        id: write.id,
                        message: "no graph session".to_string(),
                    });
                }
            }
        }
        if !forward(&output, item, &cancel).await {
            break;
        }
    }
}
