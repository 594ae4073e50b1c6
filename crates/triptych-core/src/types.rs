//! Core Data Types
//!
//! The data model shared by every crate in the workspace: item identifiers,
//! representation tags, search hits, and similarity result rows.
//!
//! Embedding vectors are passed around as plain `Vec<f32>`/`&[f32]`; the
//! vector store owns them and this core never mutates one. All vectors in a
//! collection share a fixed dimension ([`EMBEDDING_DIM`]).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dimension of every embedding vector in the collection
pub const EMBEDDING_DIM: usize = 1024;

// ============================================================================
// Item Identity
// ============================================================================

/// Opaque identifier for a catalog item
///
/// Stable across all three of an item's representations. The pipeline never
/// inspects the contents; it only passes the id through filters, log lines,
/// and result rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// ============================================================================
// Representation Tags
// ============================================================================

/// Which semantic source an embedding vector was derived from
///
/// Every point in the vector collection carries exactly one tag. Lookups and
/// searches are always filtered by (item id, tag), so the tag's serialized
/// form is part of the collection contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepTag {
    /// Embedding of the item's display name
    Name,
    /// Embedding of the item's textual attributes
    Text,
    /// Embedding of attributes extracted from the item's image
    Image,
}

impl RepTag {
    /// The tag's serialized form, as stored in point payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            RepTag::Name => "name",
            RepTag::Text => "text",
            RepTag::Image => "image",
        }
    }

    /// All tags in declaration order
    pub fn all() -> [RepTag; 3] {
        [RepTag::Name, RepTag::Text, RepTag::Image]
    }
}

impl fmt::Display for RepTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Search Hits
// ============================================================================

/// A single nearest-neighbor search result
///
/// Ephemeral, produced per query. The score uses cosine similarity semantics
/// in `[-1, 1]` where higher means more similar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Owner of the matched point
    pub item_id: ItemId,

    /// Representation tag of the matched point
    pub tag: RepTag,

    /// Text snippet stored alongside the point, if any
    #[serde(default)]
    pub snippet: String,

    /// Cosine similarity to the query vector
    pub score: f32,
}

impl SearchHit {
    /// Create a hit with an empty snippet
    pub fn new(item_id: impl Into<ItemId>, tag: RepTag, score: f32) -> Self {
        Self {
            item_id: item_id.into(),
            tag,
            snippet: String::new(),
            score,
        }
    }

    /// Builder-style: attach the stored snippet
    #[must_use]
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }
}

// ============================================================================
// Similarity Rows
// ============================================================================

/// The computed three-way similarity scores for one item
///
/// Exactly one row exists per successfully processed item. Rows are
/// all-or-nothing: a missing pairwise score fails the whole item rather than
/// producing a partial or defaulted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    /// The scored item
    pub item_id: ItemId,

    /// Best similarity between the name and text representations
    pub sim_name_text: f32,

    /// Best similarity between the name and image representations
    pub sim_name_image: f32,

    /// Best similarity between the text and image representations
    pub sim_text_image: f32,
}

impl SimilarityRow {
    /// Create a row from the three pairwise scores
    pub fn new(
        item_id: impl Into<ItemId>,
        sim_name_text: f32,
        sim_name_image: f32,
        sim_text_image: f32,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            sim_name_text,
            sim_name_image,
            sim_text_image,
        }
    }

    /// Check that all three scores lie within cosine range `[-1, 1]`
    pub fn scores_in_range(&self) -> bool {
        [self.sim_name_text, self.sim_name_image, self.sim_text_image]
            .iter()
            .all(|s| (-1.0..=1.0).contains(s))
    }
}
