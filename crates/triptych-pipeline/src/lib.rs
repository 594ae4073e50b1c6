//! Similarity Pipeline Orchestration
//!
//! This crate drives the end-to-end scoring run over a catalog's item ids.
//!
//! ## Architecture
//!
//! 1. **Partition**: the id list is split into ordered batches of fixed size
//! 2. **Reduce**: within a batch, every item's three pairwise similarity
//!    scores are computed concurrently under a run-wide concurrency ceiling
//! 3. **Commit**: the batch's successful rows are persisted in one atomic
//!    write before the next batch starts
//!
//! ## Clear Separation of Concerns
//!
//! Infrastructure crates (DO NOT orchestrate):
//! - `triptych-qdrant`: point lookup and self-scoped search
//! - `triptych-sqlite`: atomic batch persistence
//!
//! This crate (triptych-pipeline):
//! - Coordinates reduction and commit in the right order
//! - Enforces the concurrency ceiling and the sequential-batch invariant
//! - Records per-item failures without failing the batch around them
//! - Surfaces commit failures with enough context to resume the run
//!
//! ## Usage
//!
//! ```rust,ignore
//! use triptych_pipeline::{RunnerConfig, SimilarityRunner};
//!
//! let runner = SimilarityRunner::new(vectors, scores);
//! let report = runner.run(item_ids).await?;
//! println!("committed {} rows", report.committed_rows());
//! ```

pub mod config;
pub mod reducer;
pub mod report;
pub mod runner;

pub use config::RunnerConfig;
pub use reducer::SimilarityReducer;
pub use report::{BatchOutcome, ItemFailure, RunReport};
pub use runner::{RunError, SimilarityRunner};
