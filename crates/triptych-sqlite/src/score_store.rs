//! Durable similarity score persistence
//!
//! [`SqliteScoreStore`] implements [`ScoreStore`] with one transaction per
//! batch: either every row of the batch lands in `similarity_scores` or the
//! transaction rolls back and the error surfaces to the caller. It also
//! exposes the sourcing query the surrounding system uses to build the run's
//! item-id list.

use async_trait::async_trait;
use rusqlite::params;
use tracing::debug;

use triptych_core::error::{CoreError, CoreResult};
use triptych_core::store::ScoreStore;
use triptych_core::types::{ItemId, SimilarityRow};

use crate::config::SqliteConfig;
use crate::connection::ScorePool;
use crate::error::SqliteResult;

/// SQLite-backed implementation of [`ScoreStore`]
#[derive(Clone)]
pub struct SqliteScoreStore {
    pool: ScorePool,
}

impl SqliteScoreStore {
    /// Wrap an existing pool
    pub fn new(pool: ScorePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database described by `config`
    pub fn open(config: SqliteConfig) -> SqliteResult<Self> {
        Ok(Self::new(ScorePool::new(config)?))
    }

    /// In-memory store for testing
    pub fn memory() -> SqliteResult<Self> {
        Ok(Self::new(ScorePool::memory()?))
    }

    /// Distinct item ids that have recorded trait information
    ///
    /// This is the production sourcing query for a pipeline run. Ordering is
    /// fixed so repeated runs see the same batch partitioning.
    pub fn distinct_item_ids(&self) -> SqliteResult<Vec<ItemId>> {
        self.pool.with_connection(|conn| {
            let mut stmt =
                conn.prepare("SELECT DISTINCT item_id FROM item_traits ORDER BY item_id")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let ids = rows.collect::<Result<Vec<String>, _>>()?;
            Ok(ids.into_iter().map(ItemId::from).collect())
        })
    }

    /// Total persisted score rows
    pub fn row_count(&self) -> SqliteResult<u64> {
        self.pool.with_connection(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM similarity_scores", [], |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
    }

    /// Most recently persisted row for an item, if any
    pub fn scores_for(&self, item_id: &ItemId) -> SqliteResult<Option<SimilarityRow>> {
        self.pool.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT item_id, sim_name_text, sim_name_image, sim_text_image
                 FROM similarity_scores
                 WHERE item_id = ?1
                 ORDER BY id DESC
                 LIMIT 1",
            )?;

            let mut rows = stmt.query_map(params![item_id.as_str()], |row| {
                Ok(SimilarityRow::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, f32>(1)?,
                    row.get::<_, f32>(2)?,
                    row.get::<_, f32>(3)?,
                ))
            })?;

            match rows.next() {
                Some(row) => Ok(Some(row?)),
                None => Ok(None),
            }
        })
    }
}

#[async_trait]
impl ScoreStore for SqliteScoreStore {
    async fn insert_batch(&self, rows: &[SimilarityRow]) -> CoreResult<()> {
        if rows.is_empty() {
            debug!("Skipping commit of empty batch");
            return Ok(());
        }

        let pool = self.pool.clone();
        let batch = rows.to_vec();

        tokio::task::spawn_blocking(move || {
            pool.with_connection_mut(|conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(
                        "INSERT INTO similarity_scores
                         (item_id, sim_name_text, sim_name_image, sim_text_image)
                         VALUES (?1, ?2, ?3, ?4)",
                    )?;

                    for row in &batch {
                        stmt.execute(params![
                            row.item_id.as_str(),
                            row.sim_name_text,
                            row.sim_name_image,
                            row.sim_text_image,
                        ])?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
        })
        .await
        .map_err(|e| CoreError::storage(e.to_string()))??;

        debug!("Committed {} similarity rows", rows.len());
        Ok(())
    }
}
