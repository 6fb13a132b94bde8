use crate::error::{IndexError, QaError, StoreError};
use crate::models::{Chunk, SearchOptions};
use crate::retrieval::{search, search_scored, RetrievedChunk};
use crate::store::{load_index, save_index};
use crate::vectorizer::{TfIdfVectorizer, VectorSpace, VectorizerConfig};
use std::path::{Path, PathBuf};

/// A corpus together with the vector space fitted on it.
pub struct DocumentIndex {
    chunks: Vec<Chunk>,
    vectorizer: TfIdfVectorizer,
}

impl DocumentIndex {
    /// An index with no corpus; every search on it fails with `EmptyIndex`.
    pub fn empty(config: VectorizerConfig) -> Result<Self, IndexError> {
        Ok(Self {
            chunks: Vec::new(),
            vectorizer: TfIdfVectorizer::new(config)?,
        })
    }

    pub fn build(texts: Vec<String>, config: VectorizerConfig) -> Result<Self, IndexError> {
        let mut vectorizer = TfIdfVectorizer::new(config)?;
        vectorizer.fit(texts.as_slice())?;

        let chunks = texts
            .into_iter()
            .enumerate()
            .map(|(corpus_index, text)| Chunk { corpus_index, text })
            .collect();

        Ok(Self { chunks, vectorizer })
    }

    pub fn restore(location: &Path, config: VectorizerConfig) -> Result<Self, QaError> {
        let texts = load_index(location)?;
        Ok(Self::build(texts, config)?)
    }

    pub fn save(&self, location: &Path) -> Result<PathBuf, StoreError> {
        save_index(self.chunk_texts().as_slice(), location)
    }

    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<String>, IndexError> {
        search(query, &self.chunks, &self.vectorizer, options)
    }

    pub fn search_scored(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<RetrievedChunk>, IndexError> {
        search_scored(query, &self.chunks, &self.vectorizer, options)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk_texts(&self) -> Vec<String> {
        self.chunks.iter().map(|chunk| chunk.text.clone()).collect()
    }

    pub fn vectorizer_config(&self) -> &VectorizerConfig {
        self.vectorizer.config()
    }

    pub fn space(&self) -> Option<&VectorSpace> {
        self.vectorizer.space()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn texts() -> Vec<String> {
        vec![
            "Centrifugal pumps need priming before start.".to_string(),
            "Check valve orientation against the flow arrow.".to_string(),
            "Pump seals wear faster when running dry.".to_string(),
        ]
    }

    #[test]
    fn building_assigns_corpus_positions_in_order() {
        let index = DocumentIndex::build(texts(), VectorizerConfig::default())
            .expect("build should succeed");
        let positions: Vec<usize> = index.chunks().iter().map(|chunk| chunk.corpus_index).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn building_from_nothing_fails() {
        let result = DocumentIndex::build(Vec::new(), VectorizerConfig::default());
        assert!(matches!(result, Err(IndexError::EmptyCorpus)));
    }

    #[test]
    fn empty_index_rejects_search() {
        let index = DocumentIndex::empty(VectorizerConfig::default()).expect("config is valid");
        let result = index.search("x", &SearchOptions::default());
        assert!(matches!(result, Err(IndexError::EmptyIndex)));
    }

    #[test]
    fn restored_index_answers_like_the_original() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let original = DocumentIndex::build(texts(), VectorizerConfig::default())?;
        original.save(dir.path())?;

        let restored = DocumentIndex::restore(dir.path(), VectorizerConfig::default())?;
        let options = SearchOptions::default();

        assert_eq!(restored.chunk_texts(), original.chunk_texts());
        assert_eq!(restored.space(), original.space());
        assert_eq!(
            restored.search_scored("pump seals", &options)?,
            original.search_scored("pump seals", &options)?
        );
        Ok(())
    }

    #[test]
    fn restoring_without_a_saved_index_fails() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = DocumentIndex::restore(dir.path(), VectorizerConfig::default());
        assert!(matches!(result, Err(QaError::Store(StoreError::NotFound(_)))));
        Ok(())
    }
}
