pub mod chunking;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod index;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod retrieval;
pub mod stop_words;
pub mod store;
pub mod traits;
pub mod vectorizer;

pub use chunking::{normalize_text, ChunkSegmenter, ChunkStrategy, ChunkingConfig};
pub use error::{GenerationError, IndexError, IngestError, QaError, StoreError};
pub use extractor::{extract_page_texts, join_pages, LopdfExtractor, PageText, PdfExtractor};
pub use generator::{
    build_prompt, format_context, ChatCompletionGenerator, GenerationConfig, DEFAULT_LLM_ENDPOINT,
    DEFAULT_LLM_MODEL,
};
pub use index::DocumentIndex;
pub use ingest::{
    chunk_documents, collect_document_paths, discover_documents, ingest_paths_best_effort,
    load_document, IngestionReport, SkippedDocument,
};
pub use models::{
    Answer, Chunk, DocumentFingerprint, DocumentKind, EngineOptions, IngestMode, SearchOptions,
    SourceDocument,
};
pub use orchestrator::QaCoordinator;
pub use retrieval::{search, search_scored, truncate_chunk, RetrievedChunk};
pub use store::{load_index, save_index, INDEX_FILE_NAME};
pub use traits::AnswerGenerator;
pub use vectorizer::{cosine_similarity, SparseVector, TfIdfVectorizer, VectorSpace, VectorizerConfig};
