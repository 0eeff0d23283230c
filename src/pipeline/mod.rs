//! Producer/consumer download orchestration.
//!
//! One producer task crawls the listing page and feeds download items to one
//! consumer task over a rendezvous-style channel; the consumer captures each
//! body through the browser, writes it to disk, and paces itself between
//! downloads. The two tasks are joined before the run returns.
//!
//! Downloads are deliberately serial: these sites rate-limit aggressively,
//! so the consumer works one tab at a time with no cross-item parallelism,
//! and the only back-pressure is the channel's own handoff (a send suspends
//! until the consumer takes the item).
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tabrip_core::browser::{Chrome, LaunchOptions};
//! use tabrip_core::fetch::CdpBodyFetcher;
//! use tabrip_core::pipeline::{Pipeline, PipelineOptions};
//! use tabrip_core::sites::build_default_site_registry;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "https://kemono.su/patreon/user/42/post/7";
//! let strategy = build_default_site_registry().for_url(url)?;
//! let chrome = Arc::new(Chrome::launch(&LaunchOptions::default()).await?);
//! let fetcher = Arc::new(CdpBodyFetcher::new(Arc::clone(&chrome), Duration::from_secs(30)));
//! let pipeline = Pipeline::new(chrome, fetcher, PipelineOptions::default());
//! let report = pipeline.run(url, strategy).await?;
//! println!("saved {}, failed {}", report.completed(), report.failed());
//! # Ok(())
//! # }
//! ```

mod error;
mod filename;
mod item;
mod report;

pub use error::{ItemError, PipelineError};
pub use item::DownloadItem;
pub use report::{DownloadFailure, DownloadReport, PipelineStats};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::browser::Chrome;
use crate::fetch::BodyFetch;
use crate::sites::SiteStrategy;

/// Options for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Directory downloads are written into; created if absent.
    pub output_dir: PathBuf,
    /// Overrides the strategy's inter-download delay when set.
    pub delay_override: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            delay_override: None,
        }
    }
}

/// Orchestrates one listing page's downloads.
pub struct Pipeline {
    chrome: Arc<Chrome>,
    fetcher: Arc<dyn BodyFetch>,
    options: PipelineOptions,
    stats: Arc<PipelineStats>,
}

impl Pipeline {
    /// Creates a pipeline over a launched browser and a body fetcher.
    #[must_use]
    pub fn new(chrome: Arc<Chrome>, fetcher: Arc<dyn BodyFetch>, options: PipelineOptions) -> Self {
        Self {
            chrome,
            fetcher,
            options,
            stats: Arc::new(PipelineStats::new()),
        }
    }

    /// Live counters for this pipeline, shareable with a progress UI.
    #[must_use]
    pub fn stats(&self) -> Arc<PipelineStats> {
        Arc::clone(&self.stats)
    }

    /// Crawls `listing_url` with `strategy` and downloads everything it
    /// yields.
    ///
    /// Per-item failures are recorded in the returned report; only producer
    /// failures and task faults end the run with an error, and even then the
    /// consumer is drained first so no task is left behind.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Io`] if the output directory cannot be
    /// created, [`PipelineError::Extract`] if the listing page could not be
    /// crawled, and [`PipelineError::Task`] if either task panicked.
    #[instrument(level = "debug", skip(self, strategy), fields(site = strategy.name()))]
    pub async fn run(
        &self,
        listing_url: &str,
        strategy: Arc<dyn SiteStrategy>,
    ) -> Result<DownloadReport, PipelineError> {
        tokio::fs::create_dir_all(&self.options.output_dir)
            .await
            .map_err(|e| PipelineError::io(&self.options.output_dir, e))?;

        let delay = self
            .options
            .delay_override
            .unwrap_or_else(|| strategy.download_delay());
        debug!(delay_ms = delay.as_millis(), "pipeline starting");

        // Capacity 1 keeps the handoff a near-rendezvous: the producer can
        // run at most one item ahead of the consumer.
        let (tx, rx) = mpsc::channel::<DownloadItem>(1);

        let producer = tokio::spawn(produce(
            Arc::clone(&self.chrome),
            Arc::clone(&strategy),
            listing_url.to_string(),
            tx,
            Arc::clone(&self.stats),
        ));
        let consumer = tokio::spawn(consume(
            rx,
            Arc::clone(&self.fetcher),
            self.options.output_dir.clone(),
            delay,
            Arc::clone(&self.stats),
        ));

        let (produced, consumed) = tokio::join!(producer, consumer);
        let failures = consumed?;
        produced??;

        Ok(DownloadReport::new(Arc::clone(&self.stats), failures))
    }
}

/// Producer task: extract links, validate, and hand items to the consumer.
///
/// The sender is owned by this task, so the channel closes on every exit
/// path — including extraction failure — and the consumer never blocks past
/// the last item.
async fn produce(
    chrome: Arc<Chrome>,
    strategy: Arc<dyn SiteStrategy>,
    listing_url: String,
    tx: mpsc::Sender<DownloadItem>,
    stats: Arc<PipelineStats>,
) -> Result<(), crate::sites::ExtractError> {
    let session = chrome.new_session().await?;
    let candidates = strategy.discover(&session, &listing_url).await?;
    info!(
        candidates = candidates.len(),
        site = strategy.name(),
        "listing page scanned"
    );

    for candidate in candidates {
        let item = match strategy.resolve(chrome.as_ref(), candidate).await {
            Ok(item) => item,
            Err(error) => {
                warn!(%error, "skipping link that failed to resolve");
                stats.record_skipped();
                continue;
            }
        };
        if !item.is_valid(strategy.requires_file_name()) {
            warn!(item = %item, "item incomplete, skipping");
            stats.record_skipped();
            continue;
        }
        stats.record_discovered();
        // Suspends until the consumer takes the item.
        if tx.send(item).await.is_err() {
            warn!("downloader stopped receiving, abandoning extraction");
            break;
        }
    }

    if let Err(error) = session.close().await {
        warn!(%error, "failed to close listing session");
    }
    Ok(())
}

/// Consumer task: drain the channel, fetch and persist each item, pacing
/// between attempts. Terminates when the channel closes.
async fn consume(
    mut rx: mpsc::Receiver<DownloadItem>,
    fetcher: Arc<dyn BodyFetch>,
    output_dir: PathBuf,
    delay: Duration,
    stats: Arc<PipelineStats>,
) -> Vec<DownloadFailure> {
    let mut failures = Vec::new();

    while let Some(item) = rx.recv().await {
        let file_name = filename::resolve_file_name(&item);
        match download_one(fetcher.as_ref(), &item, &output_dir, &file_name).await {
            Ok(path) => {
                info!(url = %item.url, path = %path.display(), "saved");
                stats.record_completed();
            }
            Err(error) => {
                warn!(url = %item.url, %error, "download failed");
                stats.record_failed();
                failures.push(DownloadFailure {
                    file_name,
                    url: item.url.clone(),
                    error: error.to_string(),
                });
            }
        }
        tokio::time::sleep(delay).await;
    }

    failures
}

/// Fetches one item's body and writes it out. Existing files with the same
/// name are overwritten.
async fn download_one(
    fetcher: &dyn BodyFetch,
    item: &DownloadItem,
    output_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, ItemError> {
    let bytes = fetcher.fetch_body(&item.url).await?;
    let path = output_dir.join(file_name);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ItemError::io(&path, e))?;
    Ok(path)
}
