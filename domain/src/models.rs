use serde::{Deserialize, Serialize};

/// A unit of statutory text stored in the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedChunk {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    /// Corpus file the chunk was cut from.
    pub source: String,
    /// Byte offset of the chunk inside `source`.
    pub offset: usize,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: IndexedChunk,
    pub score: f32,
}
