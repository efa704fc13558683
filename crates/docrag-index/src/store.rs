use anyhow::Result;
use docrag_core::error::Error;
use docrag_core::traits::Embedder;
use docrag_core::types::{Chunk, IndexStats, IndexedEntry, RetrievalResult, SourceInfo};
use std::cmp::Ordering;
use std::path::Path;
use tracing::{debug, info};

use crate::snapshot;

/// In-memory flat vector index paired with its chunk metadata.
///
/// Vectors live in one row-major `Vec<f32>` of length
/// `dim * entries.len()`; `entries[i]` describes row `i`. The two grow
/// in lockstep, and every mutation keeps that alignment or fails before
/// touching either side.
pub struct VectorStore {
    embedder: Box<dyn Embedder>,
    dim: usize,
    vectors: Vec<f32>,
    entries: Vec<IndexedEntry>,
}

impl VectorStore {
    /// The dimension is fixed for the lifetime of the store, taken from
    /// the embedder at construction.
    pub fn new(embedder: Box<dyn Embedder>) -> Self {
        let dim = embedder.dim();
        Self { embedder, dim, vectors: Vec::new(), entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[IndexedEntry] {
        &self.entries
    }

    /// Embed and index a batch of chunks, all tagged with the same
    /// source info. Empty input is a no-op. Nothing is stored unless
    /// the whole batch embeds and validates, so a failure cannot leave
    /// vectors and metadata out of step.
    pub fn add(&mut self, chunks: &[Chunk], source_info: Option<&SourceInfo>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if embeddings.len() != chunks.len() {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            ))
            .into());
        }
        for v in &embeddings {
            if v.len() != self.dim {
                return Err(Error::Embedding(format!(
                    "embedding dimension {} does not match index dimension {}",
                    v.len(),
                    self.dim
                ))
                .into());
            }
        }

        let source = source_info.cloned().unwrap_or_default();
        for (chunk, vector) in chunks.iter().zip(embeddings) {
            self.vectors.extend_from_slice(&vector);
            self.entries.push(IndexedEntry {
                text: chunk.text.clone(),
                chunk_index: self.entries.len(),
                source: source.clone(),
                start: Some(chunk.start),
                end: Some(chunk.end),
            });
        }
        debug!("indexed {} chunks (total={})", chunks.len(), self.entries.len());
        Ok(())
    }

    /// Exact nearest-neighbor scan by squared L2 distance, ascending.
    /// Returns at most `top_k` results; an empty index short-circuits
    /// before the query is ever embedded.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut embedded = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::Embedding(e.to_string()))?;
        if embedded.len() != 1 {
            return Err(Error::Embedding(format!(
                "embedder returned {} vectors for one query",
                embedded.len()
            ))
            .into());
        }
        let q = embedded.remove(0);
        if q.len() != self.dim {
            return Err(Error::Embedding(format!(
                "query dimension {} does not match index dimension {}",
                q.len(),
                self.dim
            ))
            .into());
        }

        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(i, row)| (squared_l2(&q, row), i))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        scored.truncate(top_k.min(self.entries.len()));

        let mut results = Vec::with_capacity(scored.len());
        for (distance, idx) in scored {
            // Rows without metadata are skipped rather than reported.
            let Some(entry) = self.entries.get(idx) else {
                continue;
            };
            results.push(RetrievalResult {
                text: entry.text.clone(),
                score: distance,
                similarity: 1.0 / (1.0 + distance),
                metadata: entry.source.clone(),
                chunk_index: entry.chunk_index,
            });
        }
        Ok(results)
    }

    pub fn get_stats(&self) -> IndexStats {
        IndexStats {
            total_chunks: self.entries.len(),
            dimension: self.dim,
            model_name: self.embedder.model_name().to_string(),
        }
    }

    /// Drop all indexed data. The dimension and embedder stay.
    pub fn clear(&mut self) {
        self.vectors.clear();
        self.entries.clear();
    }

    /// Persist both snapshot artifacts.
    pub fn save(&self, vectors_path: &Path, metadata_path: &Path) -> Result<()> {
        snapshot::write_vectors(vectors_path, self.dim, &self.vectors)?;
        snapshot::write_entries(metadata_path, &self.entries)?;
        info!(
            "saved {} chunks to {} / {}",
            self.entries.len(),
            vectors_path.display(),
            metadata_path.display()
        );
        Ok(())
    }

    /// Restore from snapshot artifacts. A missing file leaves that side
    /// untouched; after loading, the vector buffer and the metadata
    /// array must line up or the load fails.
    pub fn load(&mut self, vectors_path: &Path, metadata_path: &Path) -> Result<()> {
        if let Some((dim, vectors)) = snapshot::read_vectors(vectors_path)? {
            if dim != self.dim {
                return Err(Error::Snapshot(format!(
                    "snapshot dimension {dim} does not match index dimension {}",
                    self.dim
                ))
                .into());
            }
            self.vectors = vectors;
        }
        if let Some(entries) = snapshot::read_entries(metadata_path)? {
            self.entries = entries;
        }

        if self.vectors.len() != self.dim * self.entries.len() {
            return Err(Error::Snapshot(format!(
                "snapshot mismatch: {} vector values for {} metadata entries (dim={})",
                self.vectors.len(),
                self.entries.len(),
                self.dim
            ))
            .into());
        }
        if !self.entries.is_empty() {
            info!("loaded {} chunks from snapshot", self.entries.len());
        }
        Ok(())
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
