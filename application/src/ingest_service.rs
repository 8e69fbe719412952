use anyhow::bail;
use domain::ports::EmbeddingProvider;
use infrastructure::{
    config::Config,
    corpus_scanner::CorpusScanner,
    embedder::{Embedder, EmbeddingInput},
    embedding_storage::EmbeddingStorage,
    gemini_client::GeminiClient,
};
use shared::telemetry::Telemetry;
use shared::types::Result;
use std::collections::HashSet;
use std::path::Path;

/// Populates the vector index from a directory of statutes. Runs out of band;
/// the answer pipeline only ever reads what this writes.
pub struct IngestService<P> {
    scanner: CorpusScanner,
    storage: EmbeddingStorage,
    embedder: Embedder<P>,
    embedding_model: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files_scanned: usize,
    pub files_indexed: usize,
    pub files_unchanged: usize,
    pub files_skipped: usize,
    pub files_removed: usize,
    pub chunks_written: usize,
}

impl IngestService<GeminiClient> {
    pub fn from_config(config: &Config, corpus_root: impl AsRef<Path>) -> Result<Self> {
        let client = GeminiClient::new(config)?;
        let storage = EmbeddingStorage::create(&config.vector_db_dir)?;
        let embedding_model = client.embedding_model().to_string();
        Ok(Self::new(corpus_root, storage, client, embedding_model))
    }
}

impl<P: EmbeddingProvider> IngestService<P> {
    pub fn new(
        corpus_root: impl AsRef<Path>,
        storage: EmbeddingStorage,
        provider: P,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            scanner: CorpusScanner::new(corpus_root.as_ref()),
            storage,
            embedder: Embedder::new(provider),
            embedding_model: embedding_model.into(),
        }
    }

    pub fn storage(&self) -> &EmbeddingStorage {
        &self.storage
    }

    /// Empties the index, including its recorded embedding model.
    pub fn clear_index(&self) -> Result<()> {
        self.storage.clear()?;
        tracing::info!(index = %self.storage.path().display(), "cleared vector index");
        Ok(())
    }

    /// Brings the index in line with the corpus: new and changed files are
    /// embedded, unchanged files are left alone and deleted files are dropped.
    pub async fn build_index(&self) -> Result<IngestReport> {
        let telemetry = Telemetry::new();
        if let Some(indexed_with) = self.storage.embedding_model()? {
            if indexed_with != self.embedding_model {
                bail!(
                    "index was built with {indexed_with} but {} is configured; rerun with --rebuild",
                    self.embedding_model
                );
            }
        }

        let files = self.scanner.collect_files()?;
        tracing::info!(
            corpus = %self.scanner.root().display(),
            files = files.len(),
            "scanning corpus"
        );
        let scans = self.scanner.scan_paths(&files)?;
        let mut report = IngestReport {
            files_scanned: scans.len(),
            ..IngestReport::default()
        };

        let present: HashSet<&str> = scans.iter().map(|s| s.source.as_str()).collect();
        for stale in self.storage.list_sources()? {
            if !present.contains(stale.as_str()) {
                tracing::info!(source = %stale, "removing deleted source");
                self.storage.delete_source(&stale)?;
                report.files_removed += 1;
            }
        }

        let mut inputs: Vec<EmbeddingInput> = Vec::new();
        let mut changed: Vec<(&str, &str)> = Vec::new();
        for scan in &scans {
            if scan.hash.is_empty() || scan.chunks.is_empty() {
                // Nothing indexable left in this file; drop whatever an earlier run stored.
                self.storage.delete_source(&scan.source)?;
                report.files_skipped += 1;
                continue;
            }
            let previous = self.storage.get_source_hash(&scan.source)?;
            if previous.as_deref() == Some(scan.hash.as_str()) {
                report.files_unchanged += 1;
                continue;
            }
            tracing::debug!(source = %scan.source, chunks = scan.chunks.len(), "source changed");
            inputs.extend(scan.chunks.iter().map(|chunk| EmbeddingInput {
                id: format!("{}:{}", chunk.source, chunk.start_offset),
                source: chunk.source.clone(),
                offset: chunk.start_offset,
                text: chunk.text.clone(),
            }));
            changed.push((scan.source.as_str(), scan.hash.as_str()));
        }

        if !inputs.is_empty() {
            tracing::info!(chunks = inputs.len(), "generating embeddings");
            // Embed before touching stored rows so a failed run leaves the old index intact.
            let embedded = self.embedder.generate_embeddings(&inputs).await?;
            for (source, _) in &changed {
                self.storage.delete_source(source)?;
            }
            self.storage.insert_chunks(&embedded)?;
            for (source, hash) in &changed {
                self.storage.upsert_source_hash(source, hash)?;
            }
            report.chunks_written = embedded.len();
        }
        report.files_indexed = changed.len();
        self.storage.set_embedding_model(&self.embedding_model)?;

        tracing::info!(
            elapsed_ms = telemetry.elapsed_ms() as u64,
            indexed = report.files_indexed,
            unchanged = report.files_unchanged,
            removed = report.files_removed,
            chunks = report.chunks_written,
            "indexing complete"
        );
        Ok(report)
    }
}
