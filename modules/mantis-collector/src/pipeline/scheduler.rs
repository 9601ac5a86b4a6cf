use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use mantis_common::WorkItem;

use super::orchestrator::BatchRunner;
use super::PipelineError;

pub const DEFAULT_SIZE: usize = 10;
pub const DEFAULT_DELAY: Duration = Duration::from_secs(90);

/// Batching knobs, built once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Items per batch, and workers per stage.
    pub size: usize,
    /// Pause between batches, keeping the request rate under the remote throttle.
    pub delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            delay: DEFAULT_DELAY,
        }
    }
}

/// Totals across every batch of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub total: usize,
    pub fetch_pass: usize,
    pub persist_pass: usize,
}

/// Split into consecutive chunks of `size`; the last chunk may be shorter.
pub fn into_batches(items: Vec<WorkItem>, size: usize) -> Vec<Vec<WorkItem>> {
    let size = size.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(size));
    let mut items = items.into_iter().peekable();
    while items.peek().is_some() {
        batches.push(items.by_ref().take(size).collect());
    }
    batches
}

/// Run every batch in order, sleeping `delay` between batches.
///
/// The first error stops the run: no more batches, no trailing sleep.
/// Cancelling `cancel` interrupts the sleep.
pub async fn run_batches(
    runner: &dyn BatchRunner,
    items: Vec<WorkItem>,
    config: PipelineConfig,
    cancel: &CancellationToken,
) -> Result<RunSummary, PipelineError> {
    let batches = into_batches(items, config.size);
    let count = batches.len();
    let mut summary = RunSummary::default();

    for (index, batch) in batches.into_iter().enumerate() {
        let span = info_span!("batch", batch = index + 1, of = count, size = batch.len());
        let outcome = runner.run_batch(batch).instrument(span).await?;

        summary.batches += 1;
        summary.total += outcome.total;
        summary.fetch_pass += outcome.fetch_pass;
        summary.persist_pass += outcome.persist_pass;

        if index + 1 < count && !config.delay.is_zero() {
            info!(delay_secs = config.delay.as_secs(), "Waiting before next batch");
            tokio::select! {
                _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
                _ = tokio::time::sleep(config.delay) => {}
            }
        }
    }

    Ok(summary)
}
