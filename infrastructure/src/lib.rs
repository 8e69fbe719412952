pub mod config;
pub mod corpus_scanner;
pub mod document_loader;
pub mod embedder;
pub mod embedding_storage;
pub mod gemini_client;
pub mod search;
