use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use mantis_common::{FetchError, WorkItem};

use super::{forward, next_item, SharedReceiver};
use crate::traits::{PageFetcher, RecordParser};

const STATUS_OK: u16 = 200;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Outcome of fetching one item that must stop the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimited {
    pub url: String,
}

/// Fetch every URL of `item` in order and parse each 200 response.
///
/// Each successful parse replaces the previous record, so only the last
/// URL's record survives. A failure is sticky: a later 200 does not clear
/// `fetch_error`. A 429 stops immediately and is returned as `Err`.
pub async fn fetch_item(
    item: &mut WorkItem,
    fetcher: &dyn PageFetcher,
    parser: &dyn RecordParser,
) -> Result<(), RateLimited> {
    let urls = item.urls().to_vec();
    for url in urls {
        match fetcher.get(&url).await {
            Ok(resp) if resp.status == STATUS_OK => {
                let record = parser.parse(&resp.body);
                if record.is_empty() {
                    debug!(url = url.as_str(), "Response matched no parser rules");
                }
                item.record = Some(record);
            }
            Ok(resp) if resp.status == STATUS_TOO_MANY_REQUESTS => {
                error!(status = "Failed", code = resp.status, url = url.as_str(), "Get");
                item.fetch_error = Some(FetchError::RateLimited);
                return Err(RateLimited { url });
            }
            Ok(resp) => {
                warn!(status = "Failed", code = resp.status, url = url.as_str(), "Get");
                item.fetch_error = Some(FetchError::Status(resp.status));
            }
            Err(e) => {
                warn!(status = "Failed", code = e.code(), url = url.as_str(), error = %e, "Get");
                item.fetch_error = Some(e);
            }
        }
    }
    Ok(())
}

/// Fetch worker: drain `input`, forward every item to `output`.
///
/// On a rate limit the worker cancels the batch and returns the offending
/// URL; the item is not forwarded.
pub(crate) async fn fetch_worker(
    input: SharedReceiver,
    output: mpsc::Sender<WorkItem>,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<dyn RecordParser>,
    cancel: CancellationToken,
) -> Option<RateLimited> {
    while let Some(mut item) = next_item(&input, &cancel).await {
        if let Err(limited) = fetch_item(&mut item, fetcher.as_ref(), parser.as_ref()).await {
            cancel.cancel();
            return Some(limited);
        }
        if !forward(&output, item, &cancel).await {
            break;
        }
    }
    None
}
