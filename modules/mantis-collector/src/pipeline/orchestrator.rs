use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mantis_common::WorkItem;

use super::fetch::{fetch_worker, RateLimited};
use super::metrics::{compute_time, success_rate};
use super::persist::persist_worker;
use super::PipelineError;
use crate::traits::{NodeStore, PageFetcher, RecordParser};

/// Pass counts for one batch. Fetch and persist passes are counted independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub total: usize,
    pub fetch_pass: usize,
    pub persist_pass: usize,
}

impl BatchOutcome {
    pub fn tally(items: &[WorkItem]) -> Self {
        Self {
            total: items.len(),
            fetch_pass: items.iter().filter(|item| item.fetch_ok()).count(),
            persist_pass: items.iter().filter(|item| item.persist_ok()).count(),
        }
    }
}

/// Runs one batch of work items to completion.
#[async_trait]
pub trait BatchRunner: Send + Sync {
    async fn run_batch(&self, batch: Vec<WorkItem>) -> Result<BatchOutcome, PipelineError>;
}

/// Wires a fetch pool and a persist pool together for one batch at a time.
///
/// Both pools have `workers` workers and every queue holds `workers` items,
/// so a slow stage backs up the one feeding it. Pools live only as long as
/// their batch.
pub struct Orchestrator {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn RecordParser>,
    store: Arc<dyn NodeStore>,
    workers: usize,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<dyn RecordParser>,
        store: Arc<dyn NodeStore>,
        workers: usize,
    ) -> Self {
        Self {
            fetcher,
            parser,
            store,
            workers: workers.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops the current batch and every later one.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Push `batch` through both stages and return every item once it has
    /// left the persist stage. Order is not preserved.
    pub async fn run(&self, batch: Vec<WorkItem>) -> Result<Vec<WorkItem>, PipelineError> {
        let expected = batch.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let cancel = self.cancel.child_token();
        let (fetch_tx, fetch_rx) = mpsc::channel::<WorkItem>(self.workers);
        let (persist_tx, persist_rx) = mpsc::channel::<WorkItem>(self.workers);
        let (results_tx, mut results_rx) = mpsc::channel::<WorkItem>(self.workers);
        let fetch_rx = Arc::new(Mutex::new(fetch_rx));
        let persist_rx = Arc::new(Mutex::new(persist_rx));

        let feeder_cancel = cancel.clone();
        let feeder = tokio::spawn(async move {
            for item in batch {
                if !super::forward(&fetch_tx, item, &feeder_cancel).await {
                    break;
                }
            }
        });

        let fetchers: Vec<JoinHandle<Option<RateLimited>>> = (0..self.workers)
            .map(|_| {
                tokio::spawn(fetch_worker(
                    fetch_rx.clone(),
                    persist_tx.clone(),
                    self.fetcher.clone(),
                    self.parser.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(persist_tx);

        let persisters: Vec<JoinHandle<()>> = (0..self.workers)
            .map(|_| {
                tokio::spawn(persist_worker(
                    persist_rx.clone(),
                    results_tx.clone(),
                    self.store.clone(),
                    cancel.clone(),
                ))
            })
            .collect();
        drop(results_tx);

        let mut results = Vec::with_capacity(expected);
        while results.len() < expected {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(shutdown(feeder, fetchers, persisters).await);
                }
                item = results_rx.recv() => match item {
                    Some(item) => results.push(item),
                    None => break,
                },
            }
        }

        // Closing the results queue lets every stage wind down in order.
        drop(results_rx);
        if let Err(e) = feeder.await {
            warn!(error = %e, "Feeder task failed");
        }
        for handle in fetchers {
            if let Err(e) = handle.await {
                warn!(error = %e, "Fetch worker failed");
            }
        }
        for handle in persisters {
            if let Err(e) = handle.await {
                warn!(error = %e, "Persist worker failed");
            }
        }

        if results.len() < expected {
            return Err(PipelineError::Incomplete {
                expected,
                drained: results.len(),
            });
        }
        Ok(results)
    }
}

/// Abort every task of a cancelled batch and report why it stopped.
async fn shutdown(
    feeder: JoinHandle<()>,
    fetchers: Vec<JoinHandle<Option<RateLimited>>>,
    persisters: Vec<JoinHandle<()>>,
) -> PipelineError {
    feeder.abort();
    for handle in &persisters {
        handle.abort();
    }

    let mut limited = None;
    for handle in fetchers {
        handle.abort();
        if let Ok(Some(RateLimited { url })) = handle.await {
            if limited.is_none() {
                limited = Some(url);
            }
        }
    }

    match limited {
        Some(url) => PipelineError::RateLimited { url },
        None => PipelineError::Cancelled,
    }
}

#[async_trait]
impl BatchRunner for Orchestrator {
    async fn run_batch(&self, batch: Vec<WorkItem>) -> Result<BatchOutcome, PipelineError> {
        let start = Instant::now();
        let items = self.run(batch).await?;
        let outcome = BatchOutcome::tally(&items);

        let (duration, average) = compute_time(outcome.total, start.elapsed());
        info!(
            duration = duration.as_str(),
            speed = format!("{average}/req").as_str(),
            total = outcome.total,
            "TIME STATS"
        );
        info!(
            success = success_rate(outcome.fetch_pass, outcome.total).as_str(),
            completed = outcome.fetch_pass,
            total = outcome.total,
            "HTTP REQUESTS"
        );
        info!(
            success = success_rate(outcome.persist_pass, outcome.total).as_str(),
            completed = outcome.persist_pass,
            total = outcome.total,
            "DB TRANSACTIONS"
        );

        Ok(outcome)
    }
}
