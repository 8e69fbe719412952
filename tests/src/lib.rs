//! Stub collaborators for exercising the answer pipeline without network access.

use anyhow::anyhow;
use domain::errors::UpstreamError;
use domain::models::{IndexedChunk, ScoredChunk};
use domain::ports::{EmbeddingProvider, LanguageModel, Retriever, VectorIndex};
use shared::types::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Returns a fixed list of chunks and records every query it receives.
#[derive(Default)]
pub struct StubRetriever {
    chunks: Vec<String>,
    queries: Mutex<Vec<String>>,
}

impl StubRetriever {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Retriever for StubRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.chunks.clone())
    }
}

pub struct FailingRetriever;

impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<String>> {
        Err(UpstreamError::Transport("connection refused".into()).into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelCall {
    pub prompt: String,
    pub temperature: f32,
}

/// Replies with a fixed string and records each call's arguments.
pub struct EchoModel {
    reply: String,
    calls: Mutex<Vec<ModelCall>>,
}

impl EchoModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<ModelCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl LanguageModel for EchoModel {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        self.calls.lock().unwrap().push(ModelCall {
            prompt: prompt.to_string(),
            temperature,
        });
        Ok(self.reply.clone())
    }
}

/// Fails every call, counting attempts.
#[derive(Default)]
pub struct FailingModel {
    attempts: AtomicUsize,
}

impl FailingModel {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl LanguageModel for FailingModel {
    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!(UpstreamError::Status {
            status: 503,
            body: "model overloaded".into(),
        }))
    }
}

/// Embeds every text to the same unit vector.
pub struct ConstantEmbedder;

impl EmbeddingProvider for ConstantEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Serves fixtures in the given order with descending scores and records `k`.
pub struct RankedIndex {
    texts: Vec<String>,
    requested_k: Mutex<Vec<usize>>,
}

impl RankedIndex {
    pub fn new(texts: &[&str]) -> Self {
        Self {
            texts: texts.iter().map(|t| t.to_string()).collect(),
            requested_k: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_k(&self) -> Vec<usize> {
        self.requested_k.lock().unwrap().clone()
    }
}

impl VectorIndex for RankedIndex {
    fn similarity_search(&self, _query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        self.requested_k.lock().unwrap().push(k);
        Ok(self
            .texts
            .iter()
            .take(k)
            .enumerate()
            .map(|(i, text)| ScoredChunk {
                chunk: IndexedChunk {
                    id: format!("fixture:{i}"),
                    vector: vec![1.0, 0.0],
                    text: text.clone(),
                    source: "fixtures".into(),
                    offset: i,
                },
                score: 0.9 - i as f32 * 0.1,
            })
            .collect())
    }
}
