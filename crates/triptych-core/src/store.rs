//! Storage Trait Abstractions
//!
//! The two seams between the pipeline and its backends:
//!
//! - [`VectorStore`] - read-only lookup and self-scoped search against the
//!   embedding collection
//! - [`ScoreStore`] - atomic batch persistence of computed similarity rows
//!
//! The pipeline depends only on these traits; concrete backends live in
//! `triptych-qdrant` and `triptych-sqlite`. Both traits have blanket `Arc<T>`
//! implementations so handles can be cloned freely into concurrent tasks.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::{ItemId, RepTag, SearchHit, SimilarityRow};

// ============================================================================
// VectorStore Trait
// ============================================================================

/// Read-only access to the embedding collection
///
/// # Search Scoping
///
/// `search_nearest` is always *self-scoped*: it restricts candidates to
/// points that belong to `item_id` and carry `tag`. The query vector comes
/// from one of the same item's other representations, so a search answers
/// "how well do this item's two representations agree", never "which other
/// items are similar".
///
/// # Error Handling
///
/// Implementations surface connection and protocol failures as
/// [`CoreError::Transport`](crate::CoreError::Transport). They do not retry
/// internally; retry policy belongs to the caller (see [`crate::retry`]).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Look up the single embedding stored for (item, tag)
    ///
    /// Returns `Ok(None)` if the collection holds no matching point. A
    /// collection is expected to hold at most one point per (item, tag);
    /// if duplicates exist the first match is returned.
    async fn fetch_vector(&self, item_id: &ItemId, tag: RepTag) -> CoreResult<Option<Vec<f32>>>;

    /// Self-scoped nearest-neighbor search
    ///
    /// # Arguments
    ///
    /// * `item_id` - Owner whose points are searched
    /// * `tag` - Representation tag the candidate points must carry
    /// * `query` - Query embedding vector
    /// * `top_k` - Maximum number of hits to return
    ///
    /// # Returns
    ///
    /// Up to `top_k` hits ordered by decreasing similarity. An empty vector
    /// is a valid result; interpreting it is the caller's concern.
    async fn search_nearest(
        &self,
        item_id: &ItemId,
        tag: RepTag,
        query: &[f32],
        top_k: usize,
    ) -> CoreResult<Vec<SearchHit>>;
}

// ============================================================================
// ScoreStore Trait
// ============================================================================

/// Durable, append-only persistence for similarity rows
///
/// The pipeline calls `insert_batch` exactly once per batch, from a single
/// writer, after all of the batch's item computations have joined.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Persist a batch of rows as one atomic write
    ///
    /// Either every row in `rows` becomes durable or none does. An empty
    /// batch is a no-op and must succeed.
    ///
    /// # Errors
    ///
    /// A failure means the whole batch was rolled back; the caller decides
    /// whether to retry or abort the run.
    async fn insert_batch(&self, rows: &[SimilarityRow]) -> CoreResult<()>;
}

// ============================================================================
// Blanket Implementations
// ============================================================================

/// Blanket implementation of VectorStore for Arc<T>
#[async_trait]
impl<T: VectorStore + ?Sized> VectorStore for std::sync::Arc<T> {
    async fn fetch_vector(&self, item_id: &ItemId, tag: RepTag) -> CoreResult<Option<Vec<f32>>> {
        (**self).fetch_vector(item_id, tag).await
    }

    async fn search_nearest(
        &self,
        item_id: &ItemId,
        tag: RepTag,
        query: &[f32],
        top_k: usize,
    ) -> CoreResult<Vec<SearchHit>> {
        (**self).search_nearest(item_id, tag, query, top_k).await
    }
}

/// Blanket implementation of ScoreStore for Arc<T>
#[async_trait]
impl<T: ScoreStore + ?Sized> ScoreStore for std::sync::Arc<T> {
    async fn insert_batch(&self, rows: &[SimilarityRow]) -> CoreResult<()> {
        (**self).insert_batch(rows).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::CoreError;

    /// Minimal in-memory store used to exercise the blanket impls
    struct FixedStore;

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn fetch_vector(
            &self,
            item_id: &ItemId,
            tag: RepTag,
        ) -> CoreResult<Option<Vec<f32>>> {
            if item_id.as_str() == "known" && tag == RepTag::Name {
                Ok(Some(vec![1.0, 0.0]))
            } else {
                Ok(None)
            }
        }

        async fn search_nearest(
            &self,
            item_id: &ItemId,
            tag: RepTag,
            _query: &[f32],
            top_k: usize,
        ) -> CoreResult<Vec<SearchHit>> {
            let hits = vec![
                SearchHit::new(item_id.clone(), tag, 0.9),
                SearchHit::new(item_id.clone(), tag, 0.4),
            ];
            Ok(hits.into_iter().take(top_k).collect())
        }
    }

    #[async_trait]
    impl ScoreStore for FixedStore {
        async fn insert_batch(&self, rows: &[SimilarityRow]) -> CoreResult<()> {
            if rows.iter().any(|r| !r.scores_in_range()) {
                return Err(CoreError::storage("score out of range"));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn arc_blanket_forwards_vector_calls() {
        let store: Arc<dyn VectorStore> = Arc::new(FixedStore);

        let found = store
            .fetch_vector(&ItemId::new("known"), RepTag::Name)
            .await
            .unwrap();
        assert_eq!(found, Some(vec![1.0, 0.0]));

        let missing = store
            .fetch_vector(&ItemId::new("known"), RepTag::Image)
            .await
            .unwrap();
        assert!(missing.is_none());

        let hits = store
            .search_nearest(&ItemId::new("known"), RepTag::Text, &[1.0, 0.0], 1)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn arc_blanket_forwards_score_calls() {
        let store: Arc<dyn ScoreStore> = Arc::new(FixedStore);

        let ok_rows = vec![SimilarityRow::new("P1", 0.5, 0.5, 0.5)];
        assert!(store.insert_batch(&ok_rows).await.is_ok());

        let bad_rows = vec![SimilarityRow::new("P1", 2.0, 0.5, 0.5)];
        assert!(store.insert_batch(&bad_rows).await.is_err());
    }
}
