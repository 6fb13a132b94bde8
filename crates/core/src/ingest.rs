use crate::chunking::{ChunkSegmenter, ChunkingConfig};
use crate::extractor::{join_pages, LopdfExtractor, PdfExtractor};
use crate::{DocumentFingerprint, DocumentKind, IngestError, SourceDocument};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const PREVIEW_CHARS: usize = 100;

pub fn document_kind(path: &Path) -> Option<DocumentKind> {
    let extension = path.extension().and_then(|ext| ext.to_str())?;
    if extension.eq_ignore_ascii_case("pdf") {
        Some(DocumentKind::Pdf)
    } else if extension.eq_ignore_ascii_case("txt") {
        Some(DocumentKind::PlainText)
    } else {
        None
    }
}

pub fn discover_documents(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if entry.file_type().is_file() && document_kind(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Expands directories into the documents they contain; explicit files are kept as given.
pub fn collect_document_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>, IngestError> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(discover_documents(path));
        } else {
            files.push(path.clone());
        }
    }

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(
            "no pdf or txt documents found".to_string(),
        ));
    }

    Ok(files)
}

pub fn load_document(path: &Path) -> Result<SourceDocument, IngestError> {
    load_document_with(path, &LopdfExtractor)
}

pub fn load_document_with(
    path: &Path,
    extractor: &dyn PdfExtractor,
) -> Result<SourceDocument, IngestError> {
    let kind = document_kind(path)
        .ok_or_else(|| IngestError::UnsupportedFileType(path.display().to_string()))?;

    let text = match kind {
        DocumentKind::Pdf => join_pages(&extractor.extract_pages(path)?),
        _ => fs::read_to_string(path)?,
    };
    debug!(path = %path.display(), chars = text.chars().count(), "extracted document text");

    let title = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceDocument {
        title,
        source_path: Some(path.to_path_buf()),
        kind,
        text,
    })
}

pub fn digest_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Default)]
pub struct IngestionReport {
    pub chunks: Vec<String>,
    pub documents: Vec<DocumentFingerprint>,
    pub skipped_files: Vec<SkippedDocument>,
}

impl IngestionReport {
    pub fn average_chunk_chars(&self) -> f64 {
        if self.chunks.is_empty() {
            return 0.0;
        }
        let total: usize = self.chunks.iter().map(|chunk| chunk.chars().count()).sum();
        total as f64 / self.chunks.len() as f64
    }
}

/// Chunks each document in order; the chunks of all documents form one corpus sequence.
pub fn chunk_documents(documents: &[SourceDocument], segmenter: &ChunkSegmenter) -> IngestionReport {
    let mut report = IngestionReport::default();

    for document in documents {
        let chunks = segmenter.segment(&document.text);
        info!(
            title = %document.title,
            chunk_count = chunks.len(),
            "chunked document"
        );
        if let Some(first) = chunks.first() {
            let preview: String = first.chars().take(PREVIEW_CHARS).collect();
            debug!(title = %document.title, preview = %preview, "first chunk");
        }

        report.documents.push(DocumentFingerprint {
            title: document.title.clone(),
            source_path: document
                .source_path
                .as_ref()
                .map(|path| path.to_string_lossy().to_string()),
            kind: document.kind,
            checksum: digest_text(&document.text),
            chunk_count: chunks.len(),
            ingested_at: Utc::now(),
        });
        report.chunks.extend(chunks);
    }

    report
}

pub fn ingest_paths_best_effort(
    paths: &[PathBuf],
    config: ChunkingConfig,
) -> Result<IngestionReport, IngestError> {
    let segmenter = ChunkSegmenter::new(config)?;
    let files = collect_document_paths(paths)?;

    let mut documents = Vec::new();
    let mut skipped_files = Vec::new();
    for path in files {
        match load_document(&path) {
            Ok(document) => documents.push(document),
            Err(error) => {
                warn!(path = %path.display(), reason = %error, "skipping document");
                skipped_files.push(SkippedDocument {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    let mut report = chunk_documents(&documents, &segmenter);
    report.skipped_files = skipped_files;
    info!(
        documents = report.documents.len(),
        chunk_count = report.chunks.len(),
        average_chunk_chars = report.average_chunk_chars(),
        "ingestion finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PageText;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    struct FakeExtractor;

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, _path: &Path) -> Result<Vec<PageText>, IngestError> {
            Ok(vec![
                PageText {
                    number: 1,
                    text: "Page one".to_string(),
                },
                PageText {
                    number: 2,
                    text: "Page two".to_string(),
                },
            ])
        }
    }

    fn long_paragraph(word: &str) -> String {
        vec![word; 40].join(" ")
    }

    #[test]
    fn discover_documents_is_recursive_and_filters_extensions(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("a.pdf")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        fs::write(nested.join("b.TXT"), "notes")?;
        fs::write(nested.join("c.docx"), "ignored")?;

        let files = discover_documents(base);
        assert_eq!(files.len(), 2);
        Ok(())
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let result = load_document(Path::new("slides.pptx"));
        assert!(matches!(result, Err(IngestError::UnsupportedFileType(_))));
    }

    #[test]
    fn pdf_pages_become_paragraphs() -> Result<(), Box<dyn std::error::Error>> {
        let document = load_document_with(Path::new("manual.pdf"), &FakeExtractor)?;
        assert_eq!(document.kind, DocumentKind::Pdf);
        assert_eq!(document.title, "manual.pdf");
        assert_eq!(document.text, "Page one\n\nPage two");
        Ok(())
    }

    #[test]
    fn chunks_of_all_documents_follow_ingestion_order() -> Result<(), Box<dyn std::error::Error>> {
        let segmenter = ChunkSegmenter::new(ChunkingConfig::default())?;
        let documents = vec![
            SourceDocument::pasted(long_paragraph("first")),
            SourceDocument::pasted(long_paragraph("second")),
        ];

        let report = chunk_documents(&documents, &segmenter);

        assert_eq!(report.chunks.len(), 2);
        assert!(report.chunks[0].starts_with("first"));
        assert!(report.chunks[1].starts_with("second"));
        assert_eq!(report.documents[1].chunk_count, 1);
        assert_eq!(report.documents[0].checksum, digest_text(&documents[0].text));
        Ok(())
    }

    #[test]
    fn best_effort_skips_unreadable_documents() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("unreadable.pdf"), b"%PDF-1.4\n%broken")?;
        fs::write(dir.path().join("notes.txt"), long_paragraph("valve"))?;

        let report = ingest_paths_best_effort(&[dir.path().to_path_buf()], ChunkingConfig::default())?;

        assert_eq!(report.chunks.len(), 1);
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.skipped_files.len(), 1);
        assert_eq!(
            report.skipped_files[0]
                .path
                .file_name()
                .and_then(|name| name.to_str()),
            Some("unreadable.pdf")
        );
        Ok(())
    }

    #[test]
    fn ingestion_fails_without_documents() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let result = ingest_paths_best_effort(&[dir.path().to_path_buf()], ChunkingConfig::default());
        assert!(matches!(result, Err(IngestError::InvalidArgument(_))));
        Ok(())
    }
}
