//! Batch Runner
//!
//! [`SimilarityRunner`] drives a whole scoring run: partition the item ids
//! into fixed-size batches, reduce each batch's items concurrently under a
//! run-wide permit ceiling, then commit the surviving rows in one atomic
//! write before the next batch starts.
//!
//! Batches are strictly sequential. Batch N's commit has returned before
//! any item of batch N+1 is touched, so a crash or a failed commit leaves a
//! clean prefix of durable batches and a well-defined resume point.
//!
//! Failures split two ways. An item that cannot be reduced is logged,
//! recorded in the batch outcome, and excluded from the commit; the batch
//! carries on without it. A failed commit is fatal: the run stops and the
//! error carries the report accumulated so far.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use triptych_core::error::{CoreError, CoreResult};
use triptych_core::store::{ScoreStore, VectorStore};
use triptych_core::types::{ItemId, SimilarityRow};

use crate::config::RunnerConfig;
use crate::reducer::SimilarityReducer;
use crate::report::{BatchOutcome, ItemFailure, RunReport};

// ============================================================================
// Run-level errors
// ============================================================================

/// Error type for a whole scoring run
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration failed validation before any work started
    #[error("{0}")]
    Config(String),

    /// A batch commit failed
    ///
    /// Batches before `number` are durable; batches from `number` on are
    /// not. The embedded report is the run up to the abort.
    #[error("Commit failed for batch {number}/{total}")]
    CommitFailed {
        /// 1-based number of the batch whose commit failed
        number: usize,
        /// Batches in the run
        total: usize,
        #[source]
        source: CoreError,
        /// Everything the run recorded before stopping
        report: RunReport,
    },
}

impl RunError {
    /// The partial report carried by an aborted run
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            Self::CommitFailed { report, .. } => Some(report),
            Self::Config(_) => None,
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Orchestrates batched, bounded-concurrency similarity scoring
pub struct SimilarityRunner {
    vectors: Arc<dyn VectorStore>,
    scores: Arc<dyn ScoreStore>,
    config: RunnerConfig,
}

impl SimilarityRunner {
    /// Create a runner with default configuration
    pub fn new(vectors: Arc<dyn VectorStore>, scores: Arc<dyn ScoreStore>) -> Self {
        Self::with_config(vectors, scores, RunnerConfig::default())
    }

    /// Create a runner with explicit configuration
    pub fn with_config(
        vectors: Arc<dyn VectorStore>,
        scores: Arc<dyn ScoreStore>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            vectors,
            scores,
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Score every item and commit the results batch by batch
    ///
    /// Items are processed in submission order, partitioned into batches of
    /// `batch_size`. Within a batch, items reduce concurrently under the
    /// run-wide `max_concurrency` ceiling; committed rows keep submission
    /// order regardless of completion order.
    ///
    /// # Errors
    ///
    /// [`RunError::Config`] when the configuration is invalid, and
    /// [`RunError::CommitFailed`] when a batch cannot be written. Per-item
    /// reduction failures never abort the run; they are recorded in the
    /// returned [`RunReport`].
    pub async fn run(&self, item_ids: Vec<ItemId>) -> Result<RunReport, RunError> {
        self.config
            .validate()
            .map_err(|err| RunError::Config(err.to_string()))?;

        let started_at = Utc::now();
        let total_items = item_ids.len();
        let batch_total = total_items.div_ceil(self.config.batch_size);

        info!(
            "Starting similarity run: {} items in {} batches (batch size {}, concurrency {})",
            total_items, batch_total, self.config.batch_size, self.config.max_concurrency
        );

        // One ceiling for the whole run, not one per batch
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let reducer = SimilarityReducer::new(Arc::clone(&self.vectors), self.config.top_k);

        let mut outcomes: Vec<BatchOutcome> = Vec::with_capacity(batch_total);

        for (batch_index, batch) in item_ids.chunks(self.config.batch_size).enumerate() {
            let number = batch_index + 1;
            info!(
                "Processing batch {}/{} ({} items)",
                number,
                batch_total,
                batch.len()
            );

            let mut results: Vec<(usize, ItemId, CoreResult<SimilarityRow>)> =
                stream::iter(batch.iter().cloned().enumerate())
                    .map(|(index, item_id)| {
                        let semaphore = Arc::clone(&semaphore);
                        let reducer = reducer.clone();
                        async move {
                            let result = match semaphore.acquire().await {
                                Ok(_permit) => reducer.score_item(&item_id).await,
                                Err(err) => Err(CoreError::Configuration(format!(
                                    "Concurrency limiter closed: {err}"
                                ))),
                            };
                            (index, item_id, result)
                        }
                    })
                    .buffer_unordered(self.config.max_concurrency)
                    .collect()
                    .await;

            // Completion order is arbitrary; restore submission order
            results.sort_by_key(|(index, _, _)| *index);

            let mut rows = Vec::with_capacity(batch.len());
            let mut failures = Vec::new();
            for (_, item_id, result) in results {
                match result {
                    Ok(row) => rows.push(row),
                    Err(err) => {
                        warn!("Skipping item {}: {}", item_id, err);
                        failures.push(ItemFailure::new(item_id, err));
                    }
                }
            }

            match self.scores.insert_batch(&rows).await {
                Ok(()) => {
                    info!(
                        "Committed batch {}/{}: {} rows, {} skipped",
                        number,
                        batch_total,
                        rows.len(),
                        failures.len()
                    );
                    outcomes.push(BatchOutcome {
                        number,
                        size: batch.len(),
                        rows: rows.len(),
                        failures,
                        committed: true,
                    });
                }
                Err(source) => {
                    error!(
                        "Commit failed for batch {}/{}: {}",
                        number, batch_total, source
                    );
                    outcomes.push(BatchOutcome {
                        number,
                        size: batch.len(),
                        rows: rows.len(),
                        failures,
                        committed: false,
                    });
                    let report = RunReport {
                        total_items,
                        batch_total,
                        batches: outcomes,
                        started_at,
                        finished_at: Utc::now(),
                    };
                    return Err(RunError::CommitFailed {
                        number,
                        total: batch_total,
                        source,
                        report,
                    });
                }
            }
        }

        let report = RunReport {
            total_items,
            batch_total,
            batches: outcomes,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Run complete: {} items, {} batches, {} rows committed, {} skipped",
            report.total_items,
            report.committed_batches(),
            report.committed_rows(),
            report.failed_item_count()
        );

        Ok(report)
    }
}
