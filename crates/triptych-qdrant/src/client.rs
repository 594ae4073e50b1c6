//! Qdrant HTTP client implementing the VectorStore contract
//!
//! Both operations scope their filter to one (item id, tag) pair:
//!
//! - `fetch_vector` scrolls the collection with `limit: 1` and returns the
//!   stored vector, if any
//! - `search_nearest` runs a similarity search whose candidates are the same
//!   item's points carrying the target tag
//!
//! Transient failures are retried per the configured [`RetryPolicy`]; the
//! default policy surfaces the first failure untouched.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use triptych_core::error::{CoreError, CoreResult};
use triptych_core::retry::with_retry;
use triptych_core::store::VectorStore;
use triptych_core::types::{ItemId, RepTag, SearchHit};

use crate::config::QdrantConfig;

/// Payload field holding the owning item's id
const FIELD_ITEM_ID: &str = "item_id";
/// Payload field holding the representation tag
const FIELD_TAG: &str = "tag";

/// Slack allowed before an out-of-range cosine score is treated as a
/// protocol error rather than float rounding
const SCORE_TOLERANCE: f32 = 1e-3;

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MatchValue<'a> {
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct FieldCondition<'a> {
    key: &'a str,
    #[serde(rename = "match")]
    match_on: MatchValue<'a>,
}

/// Exact-match filter restricting an operation to one (item, tag) scope
#[derive(Debug, Serialize)]
struct ScopeFilter<'a> {
    must: [FieldCondition<'a>; 2],
}

impl<'a> ScopeFilter<'a> {
    fn new(item_id: &'a ItemId, tag: RepTag) -> Self {
        Self {
            must: [
                FieldCondition {
                    key: FIELD_ITEM_ID,
                    match_on: MatchValue {
                        value: item_id.as_str(),
                    },
                },
                FieldCondition {
                    key: FIELD_TAG,
                    match_on: MatchValue {
                        value: tag.as_str(),
                    },
                },
            ],
        }
    }
}

#[derive(Debug, Serialize)]
struct ScrollRequest<'a> {
    filter: ScopeFilter<'a>,
    limit: usize,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Debug, Deserialize)]
struct ScrollResponse {
    result: ScrollResult,
}

#[derive(Debug, Deserialize)]
struct ScrollResult {
    #[serde(default)]
    points: Vec<ScrollPoint>,
}

#[derive(Debug, Deserialize)]
struct ScrollPoint {
    #[serde(default)]
    vector: Option<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    filter: ScopeFilter<'a>,
    limit: usize,
    with_payload: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Debug, Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<PointPayload>,
}

#[derive(Debug, Default, Deserialize)]
struct PointPayload {
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    tag: Option<RepTag>,
    #[serde(default)]
    snippet: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Vector store client backed by a Qdrant HTTP endpoint
pub struct QdrantStore {
    client: Client,
    config: QdrantConfig,
}

impl QdrantStore {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Configuration`] when the configuration is
    /// invalid or the HTTP client cannot be built.
    pub fn new(config: QdrantConfig) -> CoreResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                CoreError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// The collection this client operates on
    pub fn collection(&self) -> &str {
        &self.config.collection
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/collections/{}/points/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.collection,
            operation
        )
    }

    /// POST a JSON body and deserialize the response envelope
    async fn post_json<Req, Resp>(&self, url: &str, request: &Req) -> CoreResult<Resp>
    where
        Req: Serialize,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CoreError::Timeout {
                        duration_ms: self.config.timeout_secs * 1000,
                    }
                } else {
                    CoreError::transport(format!("Request to {} failed: {}", url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(CoreError::transport(format!("HTTP {}: {}", status, body)));
        }

        response.json::<Resp>().await.map_err(|e| {
            CoreError::transport(format!("Failed to parse response from {}: {}", url, e))
        })
    }

    async fn scroll_once(&self, item_id: &ItemId, tag: RepTag) -> CoreResult<Option<Vec<f32>>> {
        let url = self.endpoint("scroll");
        let request = ScrollRequest {
            filter: ScopeFilter::new(item_id, tag),
            limit: 1,
            with_payload: false,
            with_vector: true,
        };

        tracing::debug!("Fetching {} vector for item {}", tag, item_id);

        let response: ScrollResponse = self.post_json(&url, &request).await?;

        let Some(point) = response.result.points.into_iter().next() else {
            return Ok(None);
        };

        let vector = point.vector.ok_or_else(|| {
            CoreError::transport(format!(
                "Point for item {} tag {} returned without a vector",
                item_id, tag
            ))
        })?;

        if vector.len() != self.config.vector_dim {
            return Err(CoreError::transport(format!(
                "Expected {}-dim vector for item {} tag {}, got {}",
                self.config.vector_dim,
                item_id,
                tag,
                vector.len()
            )));
        }

        Ok(Some(vector))
    }

    async fn search_once(
        &self,
        item_id: &ItemId,
        tag: RepTag,
        query: &[f32],
        top_k: usize,
    ) -> CoreResult<Vec<SearchHit>> {
        let url = self.endpoint("search");
        let request = SearchRequest {
            vector: query,
            filter: ScopeFilter::new(item_id, tag),
            limit: top_k,
            with_payload: true,
        };

        tracing::debug!(
            "Searching {} points of item {} (top_k {})",
            tag,
            item_id,
            top_k
        );

        let response: SearchResponse = self.post_json(&url, &request).await?;

        response
            .result
            .into_iter()
            .map(|point| {
                let score = normalize_score(point.score).ok_or_else(|| {
                    CoreError::transport(format!(
                        "Search hit for item {} carries non-cosine score {}",
                        item_id, point.score
                    ))
                })?;

                let payload = point.payload.unwrap_or_default();
                let hit_item = payload
                    .item_id
                    .map(ItemId::from)
                    .unwrap_or_else(|| item_id.clone());
                let hit_tag = payload.tag.unwrap_or(tag);

                let mut hit = SearchHit::new(hit_item, hit_tag, score);
                if let Some(snippet) = payload.snippet {
                    hit = hit.with_snippet(snippet);
                }
                Ok(hit)
            })
            .collect()
    }
}

/// Coerce a backend score into cosine range
///
/// Scores within [`SCORE_TOLERANCE`] of the range are clamped; anything
/// further out, or NaN, is `None` and treated as a protocol error.
fn normalize_score(score: f32) -> Option<f32> {
    if score.is_nan() || score.abs() > 1.0 + SCORE_TOLERANCE {
        return None;
    }
    Some(score.clamp(-1.0, 1.0))
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn fetch_vector(&self, item_id: &ItemId, tag: RepTag) -> CoreResult<Option<Vec<f32>>> {
        with_retry(&self.config.retry, "Vector fetch", || {
            self.scroll_once(item_id, tag)
        })
        .await
    }

    async fn search_nearest(
        &self,
        item_id: &ItemId,
        tag: RepTag,
        query: &[f32],
        top_k: usize,
    ) -> CoreResult<Vec<SearchHit>> {
        with_retry(&self.config.retry, "Vector search", || {
            self.search_once(item_id, tag, query, top_k)
        })
        .await
    }
}

// ============================================================================
// Tests
// ============================================================================
