//! SQLite connection management
//!
//! A single `Arc<Mutex<Connection>>` serves the whole pipeline. Reads are
//! rare and writes arrive from exactly one place (the batch commit at the
//! end of each batch join), so a mutex-guarded connection is all the
//! serialization the sink needs.

use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::SqliteConfig;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;

/// Thread-safe SQLite connection wrapper
#[derive(Clone)]
pub struct ScorePool {
    conn: Arc<Mutex<Connection>>,
    config: SqliteConfig,
}

impl ScorePool {
    /// Open (or create) the database described by `config`
    ///
    /// Pragmas and schema migrations are applied before the pool is
    /// returned, so a freshly opened pool is ready for inserts.
    pub fn new(config: SqliteConfig) -> SqliteResult<Self> {
        info!(path = ?config.path, "Opening score database");

        let conn = if config.is_memory() {
            Connection::open_in_memory()?
        } else {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SqliteError::Connection(format!("Failed to create directory: {}", e))
                })?;
            }
            Connection::open(&config.path)?
        };

        let pool = Self {
            conn: Arc::new(Mutex::new(conn)),
            config,
        };

        pool.initialize()?;

        Ok(pool)
    }

    /// Create an in-memory pool for testing
    pub fn memory() -> SqliteResult<Self> {
        Self::new(SqliteConfig::memory())
    }

    /// Execute a closure with the connection
    pub fn with_connection<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&Connection) -> SqliteResult<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    /// Execute a closure with mutable access to the connection
    ///
    /// Required for transactions, which take `&mut Connection`.
    pub fn with_connection_mut<F, T>(&self, f: F) -> SqliteResult<T>
    where
        F: FnOnce(&mut Connection) -> SqliteResult<T>,
    {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }

    /// Configure pragmas and apply schema migrations
    fn initialize(&self) -> SqliteResult<()> {
        self.with_connection(|conn| {
            self.configure_pragmas(conn)?;
            schema::apply_migrations(conn)?;

            info!("Score database initialized");
            Ok(())
        })
    }

    fn configure_pragmas(&self, conn: &Connection) -> SqliteResult<()> {
        debug!("Configuring SQLite pragmas");

        if self.config.wal_mode {
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        }

        if self.config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }

        conn.execute_batch(&format!(
            "PRAGMA busy_timeout = {};",
            self.config.busy_timeout_ms
        ))?;

        conn.execute_batch(&format!("PRAGMA cache_size = {};", self.config.cache_size))?;

        conn.execute_batch("PRAGMA temp_store = MEMORY;")?;

        Ok(())
    }
}
