//! Schema management and migrations

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{SqliteError, SqliteResult};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = get_current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Applying schema migrations"
        );
        apply_migration_v1(conn)?;
    }

    Ok(())
}

/// Get current schema version
fn get_current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row(
            "SELECT MAX(version) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(None);

    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version) VALUES (?)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: score sink and trait-sourcing tables
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: score sink schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

/// Initial schema SQL
const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: similarity_scores
-- ============================================================================
-- One row per scored item, appended once per batch commit. The CHECK
-- constraints pin the cosine range so a bad row aborts its whole batch.

CREATE TABLE IF NOT EXISTS similarity_scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL,
    sim_name_text REAL NOT NULL CHECK (sim_name_text BETWEEN -1.0 AND 1.0),
    sim_name_image REAL NOT NULL CHECK (sim_name_image BETWEEN -1.0 AND 1.0),
    sim_text_image REAL NOT NULL CHECK (sim_text_image BETWEEN -1.0 AND 1.0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_similarity_scores_item ON similarity_scores(item_id);

-- ============================================================================
-- TABLE: item_traits
-- ============================================================================
-- Trait rows recorded by the surrounding system. The pipeline only reads
-- the distinct item-id list from here; rows are written elsewhere.

CREATE TABLE IF NOT EXISTS item_traits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id TEXT NOT NULL,
    trait_key TEXT NOT NULL,
    trait_value TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_item_traits_item ON item_traits(item_id);
"#;
