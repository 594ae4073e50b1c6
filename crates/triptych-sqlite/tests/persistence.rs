//! File-backed persistence across close and reopen
//!
//! The in-file tests run against in-memory databases; these cover the part
//! an in-memory database cannot: rows committed through one pool are still
//! there when a fresh pool opens the same file.

use anyhow::Result;
use tempfile::TempDir;

use triptych_core::store::ScoreStore;
use triptych_core::types::{ItemId, SimilarityRow};
use triptych_sqlite::{ScorePool, SqliteConfig, SqliteScoreStore};

fn sample_rows() -> Vec<SimilarityRow> {
    vec![
        SimilarityRow::new("P1", 0.82, 0.91, 0.55),
        SimilarityRow::new("P2", 0.10, -0.20, 0.30),
    ]
}

#[tokio::test]
async fn committed_rows_survive_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("scores.db");

    {
        let store = SqliteScoreStore::open(SqliteConfig::new(&db_path))?;
        store.insert_batch(&sample_rows()).await?;
        assert_eq!(store.row_count()?, 2);
    }

    // A brand-new pool on the same file sees the committed batch
    let reopened = SqliteScoreStore::open(SqliteConfig::new(&db_path))?;
    assert_eq!(reopened.row_count()?, 2);

    let row = reopened
        .scores_for(&ItemId::new("P1"))?
        .ok_or_else(|| anyhow::anyhow!("P1 missing after reopen"))?;
    assert_eq!(row.sim_name_text, 0.82);
    assert_eq!(row.sim_name_image, 0.91);
    assert_eq!(row.sim_text_image, 0.55);

    Ok(())
}

#[tokio::test]
async fn reopen_does_not_duplicate_migrations_or_rows() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("scores.db");

    let store = SqliteScoreStore::open(SqliteConfig::new(&db_path))?;
    store.insert_batch(&sample_rows()).await?;
    drop(store);

    // Open the same file several times; migrations are idempotent and no
    // rows appear or vanish
    for _ in 0..3 {
        let store = SqliteScoreStore::open(SqliteConfig::new(&db_path))?;
        assert_eq!(store.row_count()?, 2);
    }

    Ok(())
}

#[test]
fn seeded_traits_drive_id_sourcing_across_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let db_path = dir.path().join("scores.db");

    {
        let pool = ScorePool::new(SqliteConfig::new(&db_path))?;
        pool.with_connection(|conn| {
            for (item, key) in [("P2", "color"), ("P1", "size"), ("P2", "weight")] {
                conn.execute(
                    "INSERT INTO item_traits (item_id, trait_key) VALUES (?1, ?2)",
                    (item, key),
                )?;
            }
            Ok(())
        })?;
    }

    let store = SqliteScoreStore::open(SqliteConfig::new(&db_path))?;
    let ids = store.distinct_item_ids()?;

    assert_eq!(ids, vec![ItemId::new("P1"), ItemId::new("P2")]);
    Ok(())
}
