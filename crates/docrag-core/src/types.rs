//! Domain types shared by the chunker, the vector store and the
//! query engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Free-form description of where indexed text came from. Produced by
/// the loader with at least `filename` and `extension` keys.
pub type SourceInfo = HashMap<String, String>;

/// A bounded, trimmed slice of one source document.
///
/// `start`/`end` are byte offsets into the source text; `text` is the
/// whitespace-trimmed content of that span. Chunks are immutable once
/// produced and move into the vector store on ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Metadata record stored alongside each embedded vector.
///
/// Entries are append-only; `chunk_index` equals the entry's position
/// in the metadata sequence at insertion time and joins the vector
/// buffer to this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub text: String,
    pub chunk_index: usize,
    #[serde(default)]
    pub source: SourceInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

/// One retrieved chunk, recomputed per query.
///
/// `score` is the raw squared L2 distance (lower is more similar);
/// `similarity` is `1 / (1 + score)`, in (0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub text: String,
    pub score: f32,
    pub similarity: f32,
    pub metadata: SourceInfo,
    pub chunk_index: usize,
}

/// The answer to one question, with the retrieval evidence that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub retrieved_docs: Vec<RetrievalResult>,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub dimension: usize,
    pub model_name: String,
}

/// A single turn in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}
