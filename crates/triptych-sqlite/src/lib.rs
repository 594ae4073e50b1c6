//! SQLite score sink for triptych
//!
//! This crate provides the durable side of the pipeline:
//!
//! - **ScoreStore**: atomic batch persistence of similarity rows, one
//!   transaction per batch
//! - **Item-id sourcing**: the distinct-id query the surrounding system uses
//!   to decide which items to score
//! - **WAL Mode**: write-ahead logging so readers stay unblocked while a
//!   batch commits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use triptych_sqlite::{SqliteConfig, SqliteScoreStore};
//! use triptych_core::ScoreStore;
//!
//! let store = SqliteScoreStore::open(SqliteConfig::new("./scores.db"))?;
//! let ids = store.distinct_item_ids()?;
//! store.insert_batch(&rows).await?;
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod schema;
pub mod score_store;

// Re-exports
pub use config::SqliteConfig;
pub use connection::ScorePool;
pub use error::{SqliteError, SqliteResult};
pub use score_store::SqliteScoreStore;
