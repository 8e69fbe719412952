use crate::document_loader::{load_text, DocumentKind};
use memmap2::Mmap;
use rayon::prelude::*;
use shared::types::Result;
use shared::utils::is_supported_file;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

const MAX_CHUNK_CHARS: usize = 2000;
const MIN_CHUNK_CHARS: usize = 500;
const WINDOW_CHARS: usize = 1000;
const WINDOW_OVERLAP: usize = 200;

/// Walks a directory of statutes and cuts each file into indexable chunks.
pub struct CorpusScanner {
    root_path: PathBuf,
    ignored_dirs: HashSet<String>,
    max_file_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusChunk {
    pub source: String,
    pub text: String,
    pub start_offset: usize,
}

#[derive(Debug, Clone)]
pub struct SourceScan {
    pub source: String,
    /// md5 of the extracted text; empty when the file was skipped.
    pub hash: String,
    pub chunks: Vec<CorpusChunk>,
}

impl CorpusScanner {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            ignored_dirs: [".git", "vector_db", "node_modules", "__pycache__", "venv", ".cache"]
                .into_iter()
                .map(String::from)
                .collect(),
            // Bare acts rarely exceed a few MB of text; larger files are usually scans.
            max_file_bytes: 32 * 1024 * 1024,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.collect_files_recursive(&self.root_path, &mut files)?;
        files.sort();
        Ok(files)
    }

    /// Stable identifier for a corpus file: its path relative to the root.
    pub fn source_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root_path)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    pub fn scan_paths(&self, paths: &[PathBuf]) -> Result<Vec<SourceScan>> {
        tracing::debug!(files = paths.len(), "scanning corpus files");
        paths
            .par_iter()
            .map(|path| self.load_and_chunk_file(path))
            .collect()
    }

    fn collect_files_recursive(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if self.ignored_dirs.contains(name) {
                        continue;
                    }
                }
                self.collect_files_recursive(&path, files)?;
            } else if is_supported_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    fn load_and_chunk_file(&self, path: &Path) -> Result<SourceScan> {
        let source = self.source_name(path);
        let len = path.metadata()?.len();
        if len > self.max_file_bytes {
            tracing::warn!(%source, "skipping oversized corpus file");
            return Ok(SourceScan {
                source,
                hash: String::new(),
                chunks: Vec::new(),
            });
        }
        let content = match DocumentKind::from_path(path) {
            DocumentKind::Text if len == 0 => String::new(),
            DocumentKind::Text => {
                let file = File::open(path)?;
                // SAFETY: the corpus is not modified while an ingestion run is reading it.
                let mmap = unsafe { Mmap::map(&file)? };
                String::from_utf8_lossy(&mmap).into_owned()
            }
            DocumentKind::Pdf | DocumentKind::Docx => match load_text(path) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%source, error = %format!("{e:#}"), "skipping unreadable corpus file");
                    String::new()
                }
            },
        };
        if content.is_empty() {
            return Ok(SourceScan {
                source,
                hash: String::new(),
                chunks: Vec::new(),
            });
        }
        let hash = format!("{:x}", md5::compute(content.as_bytes()));
        let chunks = chunk_text(&content, &source);
        Ok(SourceScan {
            source,
            hash,
            chunks,
        })
    }
}

/// Packs blank-line separated paragraphs into chunks of roughly
/// `MIN_CHUNK_CHARS..=MAX_CHUNK_CHARS` bytes. Paragraphs longer than the
/// maximum are cut into overlapping windows. Identical chunks are kept once.
pub fn chunk_text(text: &str, source: &str) -> Vec<CorpusChunk> {
    let mut packer = ChunkPacker::new(source);

    for (offset, paragraph) in paragraphs(text) {
        if paragraph.len() > MAX_CHUNK_CHARS {
            packer.flush();
            for (start, window) in fixed_windows(paragraph) {
                packer.emit(window.to_string(), offset + start);
            }
            continue;
        }
        if !packer.current.is_empty()
            && packer.current.len() + 2 + paragraph.len() > MAX_CHUNK_CHARS
        {
            packer.flush();
        }
        packer.push(paragraph, offset);
        if packer.current.len() >= MIN_CHUNK_CHARS {
            packer.flush();
        }
    }
    packer.flush();
    packer.chunks
}

struct ChunkPacker<'a> {
    source: &'a str,
    current: String,
    current_start: usize,
    seen: HashSet<String>,
    chunks: Vec<CorpusChunk>,
}

impl<'a> ChunkPacker<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            current: String::new(),
            current_start: 0,
            seen: HashSet::new(),
            chunks: Vec::new(),
        }
    }

    fn push(&mut self, paragraph: &str, offset: usize) {
        if self.current.is_empty() {
            self.current_start = offset;
        } else {
            self.current.push_str("\n\n");
        }
        self.current.push_str(paragraph);
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.current);
        self.emit(text, self.current_start);
    }

    fn emit(&mut self, text: String, start_offset: usize) {
        let hash = format!("{:x}", md5::compute(text.as_bytes()));
        if self.seen.insert(hash) {
            self.chunks.push(CorpusChunk {
                source: self.source.to_string(),
                text,
                start_offset,
            });
        }
    }
}

/// Non-blank paragraphs with their byte offsets, trimmed.
fn paragraphs(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split("\n\n").filter_map(move |raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let offset = trimmed.as_ptr() as usize - text.as_ptr() as usize;
        Some((offset, trimmed))
    })
}

/// Overlapping windows cut on UTF-8 boundaries.
fn fixed_windows(text: &str) -> Vec<(usize, &str)> {
    let mut windows = Vec::with_capacity(text.len() / (WINDOW_CHARS - WINDOW_OVERLAP) + 2);
    let mut start = 0;
    while start < text.len() {
        let mut end = (start + WINDOW_CHARS).min(text.len());
        while end < text.len() && !text.is_char_boundary(end) {
            end += 1;
        }
        windows.push((start, &text[start..end]));
        if end == text.len() {
            break;
        }
        let mut next_start = end.saturating_sub(WINDOW_OVERLAP);
        while next_start > start && !text.is_char_boundary(next_start) {
            next_start -= 1;
        }
        start = if next_start > start { next_start } else { end };
    }
    windows
}
