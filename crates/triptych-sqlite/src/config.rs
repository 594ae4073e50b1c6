//! Configuration for the SQLite score sink

use std::env;
use std::path::PathBuf;

/// Configuration for [`ScorePool`](crate::ScorePool)
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file path; `:memory:` opens an in-memory database
    pub path: PathBuf,

    /// Enable write-ahead logging
    pub wal_mode: bool,

    /// Enforce foreign key constraints
    pub foreign_keys: bool,

    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u32,

    /// SQLite page cache size (negative values are KiB, per SQLite docs)
    pub cache_size: i64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("triptych.db"),
            wal_mode: true,
            foreign_keys: true,
            busy_timeout_ms: 5000,
            cache_size: -64000,
        }
    }
}

impl SqliteConfig {
    /// Configuration for a database at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Configuration for an in-memory database
    pub fn memory() -> Self {
        Self::new(":memory:")
    }

    /// Create configuration from environment variables
    ///
    /// Reads `TRIPTYCH_DB_PATH` and `TRIPTYCH_DB_BUSY_TIMEOUT_MS`, falling
    /// back to defaults when absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let path = env::var("TRIPTYCH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.path);

        let busy_timeout_ms = env::var("TRIPTYCH_DB_BUSY_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.busy_timeout_ms);

        Self {
            path,
            busy_timeout_ms,
            ..defaults
        }
    }

    /// Whether this configuration opens an in-memory database
    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(":memory:")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_config_is_detected() {
        assert!(SqliteConfig::memory().is_memory());
        assert!(!SqliteConfig::new("scores.db").is_memory());
    }

    #[test]
    fn defaults_enable_wal() {
        let config = SqliteConfig::default();
        assert!(config.wal_mode);
        assert!(config.foreign_keys);
        assert_eq!(config.busy_timeout_ms, 5000);
    }
}
