//! Configuration for the Qdrant client

use std::env;

use triptych_core::error::{CoreError, CoreResult};
use triptych_core::types::EMBEDDING_DIM;
use triptych_core::RetryPolicy;

/// Configuration for [`QdrantStore`](crate::QdrantStore)
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    /// Base URL of the Qdrant HTTP endpoint
    pub base_url: String,

    /// Collection holding the item embedding points
    pub collection: String,

    /// Expected dimension of every vector in the collection
    pub vector_dim: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Retry policy for transient transport failures
    pub retry: RetryPolicy,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:6333".to_string(),
            collection: "item_embeddings".to_string(),
            vector_dim: EMBEDDING_DIM,
            timeout_secs: 30,
            retry: RetryPolicy::disabled(),
        }
    }
}

impl QdrantConfig {
    /// Create a configuration for a specific endpoint and collection
    pub fn new(base_url: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Recognized variables, each falling back to its default when absent
    /// or unparsable:
    ///
    /// - `TRIPTYCH_QDRANT_URL`
    /// - `TRIPTYCH_QDRANT_COLLECTION`
    /// - `TRIPTYCH_QDRANT_TIMEOUT_SECS`
    /// - `TRIPTYCH_QDRANT_MAX_RETRIES`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url =
            env::var("TRIPTYCH_QDRANT_URL").unwrap_or_else(|_| defaults.base_url.clone());

        let collection =
            env::var("TRIPTYCH_QDRANT_COLLECTION").unwrap_or_else(|_| defaults.collection.clone());

        let timeout_secs = env::var("TRIPTYCH_QDRANT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        let max_retries = env::var("TRIPTYCH_QDRANT_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        Self {
            base_url,
            collection,
            timeout_secs,
            retry: RetryPolicy::new(max_retries, defaults.retry.base_delay_ms),
            ..defaults
        }
    }

    /// Builder-style: set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Builder-style: set the expected vector dimension
    #[must_use]
    pub fn with_vector_dim(mut self, vector_dim: usize) -> Self {
        self.vector_dim = vector_dim;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> CoreResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(CoreError::Configuration(format!(
                "Qdrant base URL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.collection.is_empty() {
            return Err(CoreError::Configuration(
                "Collection name cannot be empty".to_string(),
            ));
        }

        if self.vector_dim == 0 {
            return Err(CoreError::Configuration(
                "Vector dimension must be greater than 0".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(CoreError::Configuration(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
