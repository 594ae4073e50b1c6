//! Qdrant-backed vector store client
//!
//! This crate implements [`triptych_core::VectorStore`] against a Qdrant
//! HTTP endpoint. The collection holds one point per (item, representation)
//! pair; both operations filter by exact match on the item-id and tag payload
//! fields, so a search never leaves the scope of a single item.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use triptych_qdrant::{QdrantConfig, QdrantStore};
//!
//! let store = QdrantStore::new(QdrantConfig::from_env())?;
//! let vector = store.fetch_vector(&"P1".into(), RepTag::Name).await?;
//! ```

pub mod client;
pub mod config;

pub use client::QdrantStore;
pub use config::QdrantConfig;
