//! Run Reporting
//!
//! A run produces a [`RunReport`]: one [`BatchOutcome`] per batch in
//! processing order, each carrying the committed row count and the items
//! that failed reduction. A commit failure aborts the run, and the report
//! built up to that point travels inside the error so callers can resume
//! from the first uncommitted batch.

use chrono::{DateTime, Utc};

use triptych_core::error::CoreError;
use triptych_core::types::ItemId;

// ============================================================================
// Per-item failure
// ============================================================================

/// One item that failed reduction and was excluded from its batch commit
#[derive(Debug, Clone)]
pub struct ItemFailure {
    /// The item that failed
    pub item_id: ItemId,
    /// Why reduction failed
    pub error: CoreError,
}

impl ItemFailure {
    pub fn new(item_id: ItemId, error: CoreError) -> Self {
        Self { item_id, error }
    }

    /// Whether the failure is a gap in the stored data rather than an
    /// infrastructure fault
    pub fn is_data_gap(&self) -> bool {
        self.error.is_data_gap()
    }
}

// ============================================================================
// Per-batch outcome
// ============================================================================

/// Outcome of one batch
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// 1-based position in the run
    pub number: usize,
    /// Items assigned to the batch
    pub size: usize,
    /// Rows handed to the score store
    pub rows: usize,
    /// Items excluded from the commit
    pub failures: Vec<ItemFailure>,
    /// Whether the commit succeeded
    pub committed: bool,
}

impl BatchOutcome {
    /// Items that produced a row, whether or not the commit then succeeded
    pub fn scored(&self) -> usize {
        self.size - self.failures.len()
    }
}

// ============================================================================
// Whole-run report
// ============================================================================

/// Summary of a scoring run, complete or aborted
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Items submitted to the run
    pub total_items: usize,
    /// Batches the items were partitioned into
    pub batch_total: usize,
    /// Outcomes in processing order; shorter than `batch_total` when the
    /// run aborted
    pub batches: Vec<BatchOutcome>,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished or aborted
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Batches whose commit succeeded
    pub fn committed_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.committed).count()
    }

    /// Rows durably stored across all committed batches
    pub fn committed_rows(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.committed)
            .map(|b| b.rows)
            .sum()
    }

    /// Items that failed reduction, across all processed batches
    pub fn failed_items(&self) -> impl Iterator<Item = &ItemFailure> {
        self.batches.iter().flat_map(|b| b.failures.iter())
    }

    /// Count of items that failed reduction
    pub fn failed_item_count(&self) -> usize {
        self.batches.iter().map(|b| b.failures.len()).sum()
    }

    /// 1-based number of the first batch with no durable commit, or `None`
    /// when every batch committed
    ///
    /// An aborted run reports the batch whose commit failed; batches after
    /// it were never processed and resume from here.
    pub fn first_uncommitted_batch(&self) -> Option<usize> {
        if let Some(failed) = self.batches.iter().find(|b| !b.committed) {
            return Some(failed.number);
        }
        if self.batches.len() < self.batch_total {
            return Some(self.batches.len() + 1);
        }
        None
    }

    /// Whether every batch committed
    pub fn is_complete(&self) -> bool {
        self.first_uncommitted_batch().is_none()
    }

    /// Wall-clock duration of the run
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
