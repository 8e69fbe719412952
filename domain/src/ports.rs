//! Seams between the answer pipeline and the services it delegates to.
//!
//! Everything here is read-only from the pipeline's point of view, so
//! implementations are expected to be `Send + Sync` and shareable across
//! concurrent requests.

use crate::models::ScoredChunk;
use shared::types::Result;
use std::future::Future;
use std::sync::Arc;

/// Text to fixed-dimension vector.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send;

    /// Embeds several texts, preserving input order.
    fn embed_batch(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Nearest-neighbour lookup over stored chunks.
pub trait VectorIndex: Send + Sync {
    /// Returns at most `k` chunks, most similar first.
    fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;
}

/// Question text to ranked chunk texts.
pub trait Retriever: Send + Sync {
    fn retrieve(&self, query: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Prompt plus sampling temperature to free text.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &str, temperature: f32) -> impl Future<Output = Result<String>> + Send;
}

// Shared handles: one client or index can back several services.

impl<T: EmbeddingProvider> EmbeddingProvider for Arc<T> {
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>>> + Send {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[String]) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send {
        (**self).embed_batch(texts)
    }
}

impl<T: VectorIndex> VectorIndex for Arc<T> {
    fn similarity_search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        (**self).similarity_search(query, k)
    }
}

impl<T: Retriever> Retriever for Arc<T> {
    fn retrieve(&self, query: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
        (**self).retrieve(query)
    }
}

impl<T: LanguageModel> LanguageModel for Arc<T> {
    fn complete(&self, prompt: &str, temperature: f32) -> impl Future<Output = Result<String>> + Send {
        (**self).complete(prompt, temperature)
    }
}
