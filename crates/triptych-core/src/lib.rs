//! Core contracts for the triptych similarity scoring pipeline
//!
//! This crate defines the shared vocabulary of the workspace:
//!
//! - [`types`] - Item identifiers, representation tags, search hits, and
//!   similarity result rows
//! - [`store`] - The [`VectorStore`] and [`ScoreStore`] traits that backend
//!   crates implement
//! - [`error`] - The [`CoreError`] taxonomy shared across the pipeline
//! - [`retry`] - A bounded exponential-backoff wrapper for remote calls
//!
//! Backend crates (`triptych-qdrant`, `triptych-sqlite`) implement the traits
//! defined here; `triptych-pipeline` consumes them through `Arc<dyn ...>`
//! handles and never sees a concrete backend type.

pub mod error;
pub mod retry;
pub mod store;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use retry::{with_retry, RetryPolicy};
pub use store::{ScoreStore, VectorStore};
pub use types::{ItemId, RepTag, SearchHit, SimilarityRow, EMBEDDING_DIM};
