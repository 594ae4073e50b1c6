//! Configuration for the similarity runner

use std::env;

use triptych_core::error::{CoreError, CoreResult};

/// Configuration for [`SimilarityRunner`](crate::SimilarityRunner)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Items per commit unit
    pub batch_size: usize,

    /// Ceiling on in-flight item computations across the whole run
    pub max_concurrency: usize,

    /// Neighbors considered per pairwise search
    pub top_k: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            max_concurrency: 20,
            top_k: 10,
        }
    }
}

impl RunnerConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `TRIPTYCH_BATCH_SIZE`, `TRIPTYCH_MAX_CONCURRENCY`, and
    /// `TRIPTYCH_TOP_K`, each falling back to its default when absent or
    /// unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let read = |name: &str, fallback: usize| {
            env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            batch_size: read("TRIPTYCH_BATCH_SIZE", defaults.batch_size),
            max_concurrency: read("TRIPTYCH_MAX_CONCURRENCY", defaults.max_concurrency),
            top_k: read("TRIPTYCH_TOP_K", defaults.top_k),
        }
    }

    /// Builder-style: set the batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder-style: set the concurrency ceiling
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Builder-style: set the per-search neighbor limit
    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Validate configuration
    ///
    /// All three knobs must be non-zero; a zero batch size or ceiling would
    /// stall the run rather than bound it.
    pub fn validate(&self) -> CoreResult<()> {
        if self.batch_size == 0 {
            return Err(CoreError::Configuration(
                "Batch size must be greater than 0".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(CoreError::Configuration(
                "Max concurrency must be greater than 0".to_string(),
            ));
        }
        if self.top_k == 0 {
            return Err(CoreError::Configuration(
                "top_k must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
