use anyhow::bail;
use domain::models::IndexedChunk;
use domain::ports::EmbeddingProvider;
use futures::stream::{self, StreamExt, TryStreamExt};
use shared::types::Result;

const BATCH_SIZE: usize = 32;
const BATCHES_IN_FLIGHT: usize = 4;

/// Turns corpus chunks into index rows by calling the embedding provider in batches.
pub struct Embedder<P> {
    provider: P,
}

#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub id: String,
    pub source: String,
    pub offset: usize,
    pub text: String,
}

impl<P: EmbeddingProvider> Embedder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Output order matches `inputs`.
    pub async fn generate_embeddings(&self, inputs: &[EmbeddingInput]) -> Result<Vec<IndexedChunk>> {
        let batches: Vec<Vec<IndexedChunk>> = stream::iter(inputs.chunks(BATCH_SIZE))
            .map(|batch| self.generate_batch_embeddings(batch))
            .buffered(BATCHES_IN_FLIGHT)
            .try_collect()
            .await?;
        Ok(batches.into_iter().flatten().collect())
    }

    async fn generate_batch_embeddings(&self, inputs: &[EmbeddingInput]) -> Result<Vec<IndexedChunk>> {
        tracing::debug!(chunks = inputs.len(), "embedding batch");
        let texts: Vec<String> = inputs.iter().map(|input| input.text.clone()).collect();
        let vectors = self.provider.embed_batch(&texts).await?;
        if vectors.len() != inputs.len() {
            bail!(
                "embedding provider returned {} vectors for {} inputs",
                vectors.len(),
                inputs.len()
            );
        }
        Ok(inputs
            .iter()
            .zip(vectors)
            .map(|(input, vector)| IndexedChunk {
                id: input.id.clone(),
                vector,
                text: input.text.clone(),
                source: input.source.clone(),
                offset: input.offset,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds each text as `[len, call_index]`.
    struct LengthEmbedder {
        calls: AtomicUsize,
    }

    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as f32;
            Ok(texts.iter().map(|t| vec![t.len() as f32, call]).collect())
        }
    }

    fn input(i: usize) -> EmbeddingInput {
        EmbeddingInput {
            id: format!("rera.txt:{i}"),
            source: "rera.txt".into(),
            offset: i,
            text: "x".repeat(i + 1),
        }
    }

    #[tokio::test]
    async fn test_batches_preserve_order() {
        let embedder = Embedder::new(LengthEmbedder {
            calls: AtomicUsize::new(0),
        });
        let inputs: Vec<EmbeddingInput> = (0..70).map(input).collect();

        let chunks = embedder.generate_embeddings(&inputs).await.unwrap();

        assert_eq!(chunks.len(), 70);
        assert_eq!(embedder.provider.calls.load(Ordering::SeqCst), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id, format!("rera.txt:{i}"));
            assert_eq!(chunk.vector[0], (i + 1) as f32);
        }
    }

    #[tokio::test]
    async fn test_no_inputs_no_calls() {
        let embedder = Embedder::new(LengthEmbedder {
            calls: AtomicUsize::new(0),
        });
        assert!(embedder.generate_embeddings(&[]).await.unwrap().is_empty());
        assert_eq!(embedder.provider.calls.load(Ordering::SeqCst), 0);
    }
}
