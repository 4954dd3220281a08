//! Harvest pipeline coordinator.
//!
//! [`HarvestPipeline`] runs the linear harvest flow: collect search hits
//! sequentially, then fetch and extract package metadata with a bounded
//! amount of concurrency, with:
//! - Async execution via `tokio`
//! - A configurable timeout per metadata fetch
//! - Structured logging via `tracing`
//! - Per-record failure isolation: a bad package is skipped and recorded,
//!   never fatal to the run

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::client::{FetchError, MetadataSource, SearchSource};
use crate::collector::{CollectError, Collector};
use crate::harvest::extract::{extract, ExtractError};
use crate::model::{PackageRecord, SearchOrdering};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Complete harvest result with records and statistics.
#[derive(Debug)]
pub struct HarvestReport {
    /// Extracted records, in the collector's (page, in-page) order.
    pub records: Vec<PackageRecord>,

    /// Packages that yielded no record, with the reason, in input order.
    /// Kept so a later run can retry exactly these names.
    pub skipped: Vec<SkippedPackage>,

    /// Performance and processing statistics.
    pub stats: HarvestStats,
}

/// One package that produced no record.
#[derive(Debug)]
pub struct SkippedPackage {
    pub name: String,
    pub reason: SkipReason,
}

/// Why a package was skipped. Skips are recoverable by design; only the
/// collection stage can fail the whole run.
#[derive(thiserror::Error, Debug)]
pub enum SkipReason {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("metadata fetch timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Statistics about the harvest operation.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    /// Search hits collected across all pages.
    pub hits_collected: usize,

    /// Records successfully extracted.
    pub records_extracted: usize,

    /// Packages skipped (fetch or extraction failure).
    pub packages_skipped: usize,

    /// Time spent paginating search results (milliseconds).
    pub collect_duration_ms: u64,

    /// Time spent fetching and extracting metadata (milliseconds).
    pub fetch_duration_ms: u64,

    /// Total wall time for the run (milliseconds).
    pub total_duration_ms: u64,
}

/// Errors that can fail an entire pipeline run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// Search result collection failed (persistent challenge, dead host).
    #[error("search collection failed: {0}")]
    Collect(#[from] CollectError),
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Harvest pipeline over a search source and a metadata source.
///
/// Collection stays strictly sequential (pagination order and the
/// stop-on-empty rule depend on it) while metadata fetches run under a
/// bounded `Semaphore`. Output order always matches input order regardless
/// of fetch completion order.
///
/// # Example
///
/// ```ignore
/// use pypi_harvester::client::IndexClient;
/// use pypi_harvester::collector::Collector;
/// use pypi_harvester::harvest::pipeline::HarvestPipeline;
/// use pypi_harvester::model::SearchOrdering;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = IndexClient::new()?;
///     let pipeline =
///         HarvestPipeline::new(Collector::new(client.clone()), client).with_concurrency(4);
///     let report = pipeline.run("fpga", SearchOrdering::Newest).await?;
///     println!("harvested {} packages", report.records.len());
///     Ok(())
/// }
/// ```
pub struct HarvestPipeline<S, M>
where
    S: SearchSource,
    M: MetadataSource + 'static,
{
    /// Sequential search-page collector.
    collector: Collector<S>,

    /// Shared metadata source for the concurrent fetch stage.
    metadata: Arc<M>,

    /// Upper bound on in-flight metadata fetches (default: 4).
    concurrency: usize,

    /// Timeout per metadata fetch (default: 60 seconds).
    fetch_timeout: Duration,
}

impl<S, M> HarvestPipeline<S, M>
where
    S: SearchSource,
    M: MetadataSource + 'static,
{
    pub fn new(collector: Collector<S>, metadata: M) -> Self {
        Self {
            collector,
            metadata: Arc::new(metadata),
            concurrency: 4,
            fetch_timeout: Duration::from_secs(60),
        }
    }

    /// Sets the bound on concurrent metadata fetches (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the timeout applied to each metadata fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Runs the complete harvest for one keyword.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] only when collection itself fails. Per
    /// package failures never abort the run; they land in
    /// [`HarvestReport::skipped`].
    pub async fn run(
        &self,
        keyword: &str,
        ordering: SearchOrdering,
    ) -> Result<HarvestReport, PipelineError> {
        let start = std::time::Instant::now();
        let mut stats = HarvestStats::default();

        info!(keyword, ?ordering, "starting search collection");
        let collect_start = std::time::Instant::now();
        let hits = self.collector.collect(keyword, ordering).await?;
        stats.collect_duration_ms = collect_start.elapsed().as_millis() as u64;
        stats.hits_collected = hits.len();
        info!(
            hits = hits.len(),
            duration_ms = stats.collect_duration_ms,
            "collection completed"
        );

        let fetch_start = std::time::Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let timeout_secs = self.fetch_timeout.as_secs();

        let mut handles = Vec::with_capacity(hits.len());
        for hit in &hits {
            let name = hit.name.clone();
            let metadata = Arc::clone(&self.metadata);
            let semaphore = Arc::clone(&semaphore);
            let fetch_timeout = self.fetch_timeout;
            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SkipReason::Task(format!("semaphore closed: {e}")))?;
                let document = match timeout(fetch_timeout, metadata.fetch_document(&name)).await {
                    Err(_) => return Err(SkipReason::Timeout { timeout_secs }),
                    Ok(result) => result?,
                };
                Ok(extract(document)?)
            }));
        }

        let mut records = Vec::with_capacity(hits.len());
        let mut skipped = Vec::new();

        // Awaiting the handles in spawn order keeps output order equal to
        // input order no matter how the fetches interleave.
        for (hit, handle) in hits.iter().zip(handles) {
            let outcome = handle
                .await
                .unwrap_or_else(|e| Err(SkipReason::Task(e.to_string())));
            match outcome {
                Ok(record) => {
                    info!(
                        package = %record.name,
                        version = %record.version,
                        "extracted package record"
                    );
                    records.push(record);
                }
                Err(reason) => {
                    warn!(package = %hit.name, error = %reason, "skipping package");
                    skipped.push(SkippedPackage {
                        name: hit.name.clone(),
                        reason,
                    });
                }
            }
        }

        stats.fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;
        stats.records_extracted = records.len();
        stats.packages_skipped = skipped.len();
        stats.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            records = stats.records_extracted,
            skipped = stats.packages_skipped,
            duration_ms = stats.total_duration_ms,
            "harvest completed"
        );

        Ok(HarvestReport {
            records,
            skipped,
            stats,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
