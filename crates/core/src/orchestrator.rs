use crate::chunking::ChunkSegmenter;
use crate::index::DocumentIndex;
use crate::ingest::{chunk_documents, IngestionReport};
use crate::retrieval::RetrievedChunk;
use crate::traits::AnswerGenerator;
use crate::{Answer, EngineOptions, IngestMode, QaError, SourceDocument};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Owns the current index snapshot and the answer generator.
///
/// Rebuilds hold the write lock for the whole refit, so they serialize against each other. Searches
/// clone the current `Arc` and score against it without holding the lock, so they always see
/// either the old or the new corpus in full.
pub struct QaCoordinator<G>
where
    G: AnswerGenerator,
{
    index: RwLock<Arc<DocumentIndex>>,
    generator: G,
    options: EngineOptions,
    index_dir: Option<PathBuf>,
}

impl<G> QaCoordinator<G>
where
    G: AnswerGenerator + Send + Sync,
{
    pub fn new(generator: G, options: EngineOptions) -> Result<Self, QaError> {
        let empty = DocumentIndex::empty(options.vectorizer.clone())?;
        Ok(Self {
            index: RwLock::new(Arc::new(empty)),
            generator,
            options,
            index_dir: None,
        })
    }

    /// Persist every rebuilt index under `dir`.
    pub fn with_index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.index_dir = Some(dir.into());
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub async fn snapshot(&self) -> Arc<DocumentIndex> {
        self.index.read().await.clone()
    }

    /// Loads the persisted chunk list from `dir` and refits the vector space on it.
    pub async fn restore(&self, dir: &Path) -> Result<usize, QaError> {
        let restored = DocumentIndex::restore(dir, self.options.vectorizer.clone())?;
        let chunk_count = restored.len();
        *self.index.write().await = Arc::new(restored);
        info!(path = %dir.display(), chunk_count, "index restored");
        Ok(chunk_count)
    }

    pub async fn ingest(
        &self,
        documents: &[SourceDocument],
        mode: IngestMode,
    ) -> Result<IngestionReport, QaError> {
        let segmenter = ChunkSegmenter::new(self.options.chunking)?;
        let report = chunk_documents(documents, &segmenter);
        self.rebuild(report.chunks.clone(), mode).await?;
        Ok(report)
    }

    pub async fn ingest_pasted_text(
        &self,
        text: &str,
        mode: IngestMode,
    ) -> Result<IngestionReport, QaError> {
        self.ingest(&[SourceDocument::pasted(text)], mode).await
    }

    /// Replaces (or extends) the corpus with `chunks` and refits the whole index.
    pub async fn rebuild(&self, chunks: Vec<String>, mode: IngestMode) -> Result<usize, QaError> {
        let mut guard = self.index.write().await;

        let texts = match mode {
            IngestMode::Replace => chunks,
            IngestMode::Append => {
                let mut texts = guard.chunk_texts();
                texts.extend(chunks);
                texts
            }
        };

        let rebuilt = DocumentIndex::build(texts, self.options.vectorizer.clone())?;
        if let Some(dir) = &self.index_dir {
            let path = rebuilt.save(dir)?;
            info!(path = %path.display(), "index saved");
        }

        let chunk_count = rebuilt.len();
        *guard = Arc::new(rebuilt);
        info!(chunk_count, ?mode, "index rebuilt");
        Ok(chunk_count)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<RetrievedChunk>, QaError> {
        let index = self.snapshot().await;
        Ok(index.search_scored(query, &self.options.search)?)
    }

    pub async fn ask(&self, question: &str) -> Result<Answer, QaError> {
        let context: Vec<String> = self
            .search(question)
            .await?
            .into_iter()
            .map(|hit| hit.text)
            .collect();
        info!(context_chunks = context.len(), "retrieved context");

        let answer = self.generator.generate(question, &context).await?;
        Ok(Answer {
            question: question.to_string(),
            answer,
            context,
        })
    }
}
