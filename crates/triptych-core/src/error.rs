//! Pipeline Error Types
//!
//! One taxonomy shared across the workspace. Variants are `Clone` with
//! string payloads so per-item failures can be collected across task joins
//! and carried in run reports.

use thiserror::Error;

use crate::types::RepTag;

/// Error type for similarity pipeline operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// An item lacks a required representation vector
    #[error("Missing {tag} vector for item {item_id}")]
    MissingRepresentation { item_id: String, tag: RepTag },

    /// A self-scoped search returned zero hits
    ///
    /// There is no defined maximum over zero hits, so the item fails rather
    /// than receiving a default score.
    #[error("No {target} hits for item {item_id} ({query} query)")]
    EmptySearchResult {
        item_id: String,
        query: RepTag,
        target: RepTag,
    },

    /// The vector store is unreachable or returned a protocol-level error
    #[error("Transport error: {0}")]
    Transport(String),

    /// The durable score store failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Operation timed out
    #[error("Timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for pipeline operations
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a missing-representation error
    pub fn missing_representation(item_id: impl Into<String>, tag: RepTag) -> Self {
        Self::MissingRepresentation {
            item_id: item_id.into(),
            tag,
        }
    }

    /// Create an empty-search-result error for a pairwise search
    pub fn empty_search(item_id: impl Into<String>, query: RepTag, target: RepTag) -> Self {
        Self::EmptySearchResult {
            item_id: item_id.into(),
            query,
            target,
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Self::Storage(msg.into())
    }

    /// Check if the error is retryable
    ///
    /// Only transient remote failures qualify. Missing representations and
    /// empty searches describe the data, not the connection, and retrying
    /// them would return the same answer.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Storage(_) | Self::Timeout { .. }
        )
    }

    /// Check if the error describes an item's data rather than a failure
    /// of the machinery around it
    pub fn is_data_gap(&self) -> bool {
        matches!(
            self,
            Self::MissingRepresentation { .. } | Self::EmptySearchResult { .. }
        )
    }
}
