use crate::embedding_storage::EmbeddingStorage;
use domain::errors::UpstreamError;
use domain::models::{IndexedChunk, ScoredChunk};
use domain::ports::VectorIndex;
use rayon::prelude::*;
use shared::types::Result;

/// In-memory copy of the persisted index, scored by cosine similarity.
pub struct SearchEngine {
    chunks: Vec<IndexedChunk>,
    dimension: Option<usize>,
}

impl SearchEngine {
    /// Rows whose vector length differs from the first row are dropped.
    pub fn new(mut chunks: Vec<IndexedChunk>) -> Self {
        let dimension = chunks.first().map(|c| c.vector.len());
        if let Some(dim) = dimension {
            let before = chunks.len();
            chunks.retain(|c| c.vector.len() == dim);
            let dropped = before - chunks.len();
            if dropped > 0 {
                tracing::warn!(
                    dropped,
                    dimension = dim,
                    "skipping chunks with mismatched vector length"
                );
            }
        }
        Self { chunks, dimension }
    }

    /// Loads every stored chunk once; the serving path never writes.
    pub fn load(storage: &EmbeddingStorage) -> Result<Self> {
        let chunks = storage.get_all_chunks()?;
        if chunks.is_empty() {
            tracing::warn!("vector index is empty; answers will carry no legal context");
        } else {
            tracing::info!(chunks = chunks.len(), "vector index loaded");
        }
        Ok(Self::new(chunks))
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }

    pub fn find_relevant_chunks(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if let Some(dim) = self.dimension {
            if dim != query.len() {
                return Err(UpstreamError::Index(format!(
                    "query has {} dimensions, index has {}",
                    query.len(),
                    dim
                ))
                .into());
            }
        }

        let mut scored: Vec<(f32, usize)> = self
            .chunks
            .par_iter()
            .enumerate()
            .map(|(i, chunk)| (Self::cosine_similarity(query, &chunk.vector), i))
            .collect();

        // Ties keep insertion order so results are stable across runs.
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(score, i)| ScoredChunk {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }
}

impl VectorIndex for SearchEngine {
    fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        self.find_relevant_chunks(query, k)
    }
}
