use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("cannot fit a vector space on an empty corpus")]
    EmptyCorpus,

    #[error("vector space has not been fitted yet")]
    NotFitted,

    #[error("no documents indexed, process documents first")]
    EmptyIndex,

    #[error("invalid search options: {0}")]
    InvalidSearchOptions(String),

    #[error("invalid vectorizer config: {0}")]
    InvalidVectorizerConfig(String),

    #[error("invalid token pattern: {0}")]
    TokenPattern(#[from] regex::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("index file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("index file {} is not a JSON array of strings: {details}", .path.display())]
    Corrupt { path: PathBuf, details: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("generation returned no answer")]
    EmptyAnswer,
}

#[derive(Debug, Error)]
pub enum QaError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
