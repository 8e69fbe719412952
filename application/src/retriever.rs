use anyhow::Context;
use domain::ports::{EmbeddingProvider, Retriever, VectorIndex};
use shared::types::Result;

/// Number of statute chunks placed in every prompt.
pub const RETRIEVAL_K: usize = 3;

/// Embeds the query and asks the vector index for its nearest chunks.
pub struct IndexRetriever<E, V> {
    embedder: E,
    index: V,
    k: usize,
}

impl<E: EmbeddingProvider, V: VectorIndex> IndexRetriever<E, V> {
    pub fn new(embedder: E, index: V) -> Self {
        Self {
            embedder,
            index,
            k: RETRIEVAL_K,
        }
    }
}

impl<E: EmbeddingProvider, V: VectorIndex> Retriever for IndexRetriever<E, V> {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        let query_vector = self
            .embedder
            .embed(query)
            .await
            .context("failed to embed the question")?;
        let hits = self
            .index
            .similarity_search(&query_vector, self.k)
            .context("similarity search failed")?;
        tracing::debug!(
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved legal context"
        );
        Ok(hits
            .into_iter()
            .take(self.k)
            .map(|hit| hit.chunk.text)
            .collect())
    }
}
