//! Similarity Reduction
//!
//! [`SimilarityReducer`] computes the three-way similarity triple for one
//! item: fetch the item's name and text vectors, run the three self-scoped
//! pairwise searches, and reduce each hit list to its maximum score.
//!
//! The image vector is never fetched. It only ever serves as a search
//! target, so its presence is observed through the image-tagged hit lists.
//!
//! Reduction is all-or-nothing: a missing vector or an empty hit list fails
//! the item instead of defaulting any score, and the failure carries the
//! item id plus the pair that broke.

use std::sync::Arc;

use tracing::debug;

use triptych_core::error::{CoreError, CoreResult};
use triptych_core::store::VectorStore;
use triptych_core::types::{ItemId, RepTag, SimilarityRow};

/// Computes one item's pairwise representation agreement scores
#[derive(Clone)]
pub struct SimilarityReducer {
    vectors: Arc<dyn VectorStore>,
    top_k: usize,
}

impl SimilarityReducer {
    /// Create a reducer reading from `vectors`, considering `top_k`
    /// neighbors per search
    pub fn new(vectors: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self { vectors, top_k }
    }

    /// Compute the similarity row for one item
    ///
    /// The three searches run in sequence; concurrency across items is the
    /// runner's concern, not the reducer's.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingRepresentation`] when the name or text vector
    ///   is absent
    /// - [`CoreError::EmptySearchResult`] when any pairwise search returns
    ///   zero hits
    /// - [`CoreError::Transport`] from the underlying store
    pub async fn score_item(&self, item_id: &ItemId) -> CoreResult<SimilarityRow> {
        let name_vector = self.require_vector(item_id, RepTag::Name).await?;
        let text_vector = self.require_vector(item_id, RepTag::Text).await?;

        let sim_name_text = self
            .best_pairwise(item_id, RepTag::Name, RepTag::Text, &name_vector)
            .await?;
        let sim_name_image = self
            .best_pairwise(item_id, RepTag::Name, RepTag::Image, &name_vector)
            .await?;
        let sim_text_image = self
            .best_pairwise(item_id, RepTag::Text, RepTag::Image, &text_vector)
            .await?;

        debug!(
            "Scored item {}: name/text {:.4}, name/image {:.4}, text/image {:.4}",
            item_id, sim_name_text, sim_name_image, sim_text_image
        );

        Ok(SimilarityRow::new(
            item_id.clone(),
            sim_name_text,
            sim_name_image,
            sim_text_image,
        ))
    }

    /// Fetch a vector that the reduction cannot proceed without
    async fn require_vector(&self, item_id: &ItemId, tag: RepTag) -> CoreResult<Vec<f32>> {
        self.vectors
            .fetch_vector(item_id, tag)
            .await?
            .ok_or_else(|| CoreError::missing_representation(item_id.as_str(), tag))
    }

    /// Best agreement between the `query`-tagged vector and the item's
    /// `target`-tagged points
    ///
    /// The self-scoped search returns at most a few hits; the maximum picks
    /// the best-aligned variant. Zero hits means the target representation
    /// is absent, which fails the item.
    async fn best_pairwise(
        &self,
        item_id: &ItemId,
        query: RepTag,
        target: RepTag,
        vector: &[f32],
    ) -> CoreResult<f32> {
        let hits = self
            .vectors
            .search_nearest(item_id, target, vector, self.top_k)
            .await?;

        hits.into_iter()
            .map(|hit| hit.score)
            .reduce(f32::max)
            .ok_or_else(|| CoreError::empty_search(item_id.as_str(), query, target))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use triptych_core::types::SearchHit;

    use super::*;

    /// Scripted vector store: fixed vectors per (item, tag) and fixed hit
    /// scores per (item, query tag, target tag)
    #[derive(Default)]
    struct ScriptedVectors {
        vectors: HashMap<(String, RepTag), Vec<f32>>,
        hits: HashMap<(String, RepTag, RepTag), Vec<f32>>,
        search_calls: AtomicUsize,
    }

    impl ScriptedVectors {
        fn vector(mut self, item: &str, tag: RepTag, v: Vec<f32>) -> Self {
            self.vectors.insert((item.to_string(), tag), v);
            self
        }

        fn pair(mut self, item: &str, query: RepTag, target: RepTag, scores: Vec<f32>) -> Self {
            self.hits.insert((item.to_string(), query, target), scores);
            self
        }

        /// Which representation produced this query vector
        fn query_tag(&self, item: &str, query: &[f32]) -> Option<RepTag> {
            self.vectors
                .iter()
                .find(|((id, _), v)| id == item && v.as_slice() == query)
                .map(|((_, tag), _)| *tag)
        }
    }

    #[async_trait]
    impl VectorStore for ScriptedVectors {
        async fn fetch_vector(
            &self,
            item_id: &ItemId,
            tag: RepTag,
        ) -> CoreResult<Option<Vec<f32>>> {
            Ok(self.vectors.get(&(item_id.as_str().to_string(), tag)).cloned())
        }

        async fn search_nearest(
            &self,
            item_id: &ItemId,
            tag: RepTag,
            query: &[f32],
            top_k: usize,
        ) -> CoreResult<Vec<SearchHit>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);

            let query_tag = self
                .query_tag(item_id.as_str(), query)
                .ok_or_else(|| CoreError::transport("query vector not in fixture"))?;

            let scores = self
                .hits
                .get(&(item_id.as_str().to_string(), query_tag, tag))
                .cloned()
                .unwrap_or_default();

            Ok(scores
                .into_iter()
                .take(top_k)
                .map(|score| SearchHit::new(item_id.clone(), tag, score))
                .collect())
        }
    }

    fn p1_fixture() -> ScriptedVectors {
        ScriptedVectors::default()
            .vector("P1", RepTag::Name, vec![1.0, 0.0, 0.0, 0.0])
            .vector("P1", RepTag::Text, vec![0.0, 1.0, 0.0, 0.0])
            .pair("P1", RepTag::Name, RepTag::Text, vec![0.8, 0.6])
            .pair("P1", RepTag::Name, RepTag::Image, vec![0.9])
            .pair("P1", RepTag::Text, RepTag::Image, vec![0.5, 0.55])
    }

    #[tokio::test]
    async fn reduces_each_pair_to_its_maximum() {
        let reducer = SimilarityReducer::new(Arc::new(p1_fixture()), 10);

        let row = reducer.score_item(&ItemId::new("P1")).await.unwrap();

        assert_eq!(row.item_id.as_str(), "P1");
        assert_eq!(row.sim_name_text, 0.8);
        assert_eq!(row.sim_name_image, 0.9);
        assert_eq!(row.sim_text_image, 0.55);
        assert!(row.scores_in_range());
    }

    #[tokio::test]
    async fn reduction_is_deterministic() {
        let reducer = SimilarityReducer::new(Arc::new(p1_fixture()), 10);

        let first = reducer.score_item(&ItemId::new("P1")).await.unwrap();
        let second = reducer.score_item(&ItemId::new("P1")).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn hit_order_does_not_change_the_maximum() {
        let store = ScriptedVectors::default()
            .vector("P1", RepTag::Name, vec![1.0, 0.0])
            .vector("P1", RepTag::Text, vec![0.0, 1.0])
            .pair("P1", RepTag::Name, RepTag::Text, vec![0.6, 0.8])
            .pair("P1", RepTag::Name, RepTag::Image, vec![0.9])
            .pair("P1", RepTag::Text, RepTag::Image, vec![0.55, 0.5]);
        let reducer = SimilarityReducer::new(Arc::new(store), 10);

        let row = reducer.score_item(&ItemId::new("P1")).await.unwrap();
        assert_eq!(row.sim_name_text, 0.8);
        assert_eq!(row.sim_text_image, 0.55);
    }

    #[tokio::test]
    async fn missing_name_vector_fails_before_any_search() {
        let store = ScriptedVectors::default().vector("P1", RepTag::Text, vec![0.0, 1.0]);
        let store = Arc::new(store);
        let reducer = SimilarityReducer::new(store.clone(), 10);

        let err = reducer.score_item(&ItemId::new("P1")).await.unwrap_err();

        assert_eq!(
            err,
            CoreError::missing_representation("P1", RepTag::Name)
        );
        assert_eq!(store.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_text_vector_fails_the_item() {
        let store = ScriptedVectors::default().vector("P1", RepTag::Name, vec![1.0, 0.0]);
        let reducer = SimilarityReducer::new(Arc::new(store), 10);

        let err = reducer.score_item(&ItemId::new("P1")).await.unwrap_err();
        assert_eq!(err, CoreError::missing_representation("P1", RepTag::Text));
    }

    #[tokio::test]
    async fn zero_hits_are_a_failure_not_a_zero_score() {
        // P2 has name and text vectors but no image-tagged points at all
        let store = ScriptedVectors::default()
            .vector("P2", RepTag::Name, vec![1.0, 0.0])
            .vector("P2", RepTag::Text, vec![0.0, 1.0])
            .pair("P2", RepTag::Name, RepTag::Text, vec![0.7]);
        let reducer = SimilarityReducer::new(Arc::new(store), 10);

        let err = reducer.score_item(&ItemId::new("P2")).await.unwrap_err();

        assert_eq!(
            err,
            CoreError::empty_search("P2", RepTag::Name, RepTag::Image)
        );
    }

    #[tokio::test]
    async fn transport_failure_carries_through() {
        // Vectors resolve fine; every search fails at the wire
        struct FailingSearch;

        #[async_trait]
        impl VectorStore for FailingSearch {
            async fn fetch_vector(
                &self,
                _item_id: &ItemId,
                _tag: RepTag,
            ) -> CoreResult<Option<Vec<f32>>> {
                Ok(Some(vec![1.0, 0.0]))
            }

            async fn search_nearest(
                &self,
                _item_id: &ItemId,
                _tag: RepTag,
                _query: &[f32],
                _top_k: usize,
            ) -> CoreResult<Vec<SearchHit>> {
                Err(CoreError::transport("connection refused"))
            }
        }

        let reducer = SimilarityReducer::new(Arc::new(FailingSearch), 10);
        let err = reducer.score_item(&ItemId::new("P1")).await.unwrap_err();

        assert!(matches!(err, CoreError::Transport(_)));
    }

    #[tokio::test]
    async fn top_k_limits_hits_seen_by_the_reduction() {
        // Best score sits beyond top_k, so the reduced maximum comes from
        // the truncated prefix
        let store = ScriptedVectors::default()
            .vector("P1", RepTag::Name, vec![1.0, 0.0])
            .vector("P1", RepTag::Text, vec![0.0, 1.0])
            .pair("P1", RepTag::Name, RepTag::Text, vec![0.6, 0.5, 0.95])
            .pair("P1", RepTag::Name, RepTag::Image, vec![0.9])
            .pair("P1", RepTag::Text, RepTag::Image, vec![0.5]);
        let reducer = SimilarityReducer::new(Arc::new(store), 2);

        let row = reducer.score_item(&ItemId::new("P1")).await.unwrap();
        assert_eq!(row.sim_name_text, 0.6);
    }
}
