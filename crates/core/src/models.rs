use crate::chunking::ChunkingConfig;
use crate::vectorizer::VectorizerConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A normalized piece of a source document and its position in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub corpus_index: usize,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    PlainText,
    Pasted,
}

/// Raw extracted text of one document, before normalization.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub title: String,
    pub source_path: Option<PathBuf>,
    pub kind: DocumentKind,
    pub text: String,
}

impl SourceDocument {
    pub fn pasted(text: impl Into<String>) -> Self {
        Self {
            title: "pasted text".to_string(),
            source_path: None,
            kind: DocumentKind::Pasted,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub title: String,
    pub source_path: Option<String>,
    pub kind: DocumentKind,
    pub checksum: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// The new chunks become the whole corpus.
    #[default]
    Replace,
    /// The new chunks follow the chunks already indexed; the vector space is refit over both.
    Append,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub min_similarity: f64,
    pub max_chunk_chars: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.05,
            max_chunk_chars: 1_000,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub chunking: ChunkingConfig,
    pub vectorizer: VectorizerConfig,
    pub search: SearchOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
    pub context: Vec<String>,
}
