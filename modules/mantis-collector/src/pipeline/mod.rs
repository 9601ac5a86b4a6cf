//! Fetch → parse → persist pipeline.
//!
//! Parameter rows are expanded into work items (`expand`), split into
//! batches (`scheduler`), and each batch runs through two worker pools wired
//! with bounded channels (`orchestrator`): fetch workers (`fetch`) feed
//! persist workers (`persist`). Per-item failures stay on the item; only a
//! remote rate limit stops the run.

pub mod expand;
pub mod fetch;
pub mod metrics;
pub mod orchestrator;
pub mod persist;
pub mod scheduler;


use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use mantis_common::WorkItem;

pub use expand::{build_request, build_work_items};
pub use orchestrator::{BatchOutcome, BatchRunner, Orchestrator};
pub use persist::{plan_writes, NodeWrite};
pub use scheduler::{run_batches, PipelineConfig, RunSummary};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("remote rate limit (429) hit fetching {url}")]
    RateLimited { url: String },

    #[error("pipeline cancelled")]
    Cancelled,

    #[error("batch ended early: drained {drained} of {expected} items")]
    Incomplete { expected: usize, drained: usize },
}

/// Input side of a stage, shared by every worker in the pool.
pub(crate) type SharedReceiver = Arc<Mutex<mpsc::Receiver<WorkItem>>>;

/// Take the next item, or `None` once the queue is closed or the batch is cancelled.
pub(crate) async fn next_item(input: &SharedReceiver, cancel: &CancellationToken) -> Option<WorkItem> {
    let mut rx = input.lock().await;
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        item = rx.recv() => item,
    }
}

/// Send downstream, giving up if the batch is cancelled while the queue is full.
/// Returns false when the item could not be delivered.
pub(crate) async fn forward(
    output: &mpsc::Sender<WorkItem>,
    item: WorkItem,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = output.send(item) => sent.is_ok(),
    }
}
