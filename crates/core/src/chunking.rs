use crate::error::IngestError;
use regex::Regex;

pub const DEFAULT_CHUNK_MAX_CHARS: usize = 2_000;
pub const DEFAULT_CHUNK_OVERLAP_CHARS: usize = 300;
pub const DEFAULT_CHUNK_MIN_CHARS: usize = 100;

const PARAGRAPH_BREAK: &str = r"\n[^\S\n]*\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkStrategy {
    /// Split raw text on blank lines, normalize each paragraph, then pack paragraphs greedily.
    #[default]
    Paragraph,
    /// Normalize the whole text and cut fixed-width character windows that overlap.
    SlidingWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
    pub min_chars: usize,
    pub strategy: ChunkStrategy,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_MAX_CHARS,
            overlap_chars: DEFAULT_CHUNK_OVERLAP_CHARS,
            min_chars: DEFAULT_CHUNK_MIN_CHARS,
            strategy: ChunkStrategy::Paragraph,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }

        if self.overlap_chars >= self.max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_chars ({}) must be smaller than max_chars ({})",
                self.overlap_chars, self.max_chars
            )));
        }

        Ok(())
    }
}

/// Collapses whitespace runs to one space and keeps only word characters and `. , ! ? -`.
///
/// Dropped characters do not split a whitespace run, so the result never holds two
/// adjacent spaces and normalizing twice changes nothing.
pub fn normalize_text(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut pending_space = false;

    for ch in raw.chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        if !is_retained(ch) {
            continue;
        }

        if pending_space && !normalized.is_empty() {
            normalized.push(' ');
        }
        pending_space = false;
        normalized.push(ch);
    }

    normalized
}

fn is_retained(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || matches!(ch, '.' | ',' | '!' | '?' | '-')
}

pub struct ChunkSegmenter {
    config: ChunkingConfig,
    paragraph_break: Regex,
}

impl ChunkSegmenter {
    pub fn new(config: ChunkingConfig) -> Result<Self, IngestError> {
        config.validate()?;
        Ok(Self {
            config,
            paragraph_break: Regex::new(PARAGRAPH_BREAK)?,
        })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Takes raw extracted text; every returned chunk is already normalized.
    pub fn segment(&self, raw: &str) -> Vec<String> {
        let chunks = match self.config.strategy {
            ChunkStrategy::Paragraph => self.pack_paragraphs(raw),
            ChunkStrategy::SlidingWindow => self.sliding_windows(raw),
        };

        chunks
            .into_iter()
            .filter(|chunk| chunk.chars().count() >= self.config.min_chars)
            .collect()
    }

    pub fn split_paragraphs(&self, raw: &str) -> Vec<String> {
        self.paragraph_break
            .split(raw)
            .map(normalize_text)
            .filter(|paragraph| !paragraph.is_empty())
            .collect()
    }

    fn pack_paragraphs(&self, raw: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for paragraph in self.split_paragraphs(raw) {
            let paragraph_len = paragraph.chars().count();

            if current.is_empty() {
                current = paragraph;
                current_len = paragraph_len;
                continue;
            }

            if current_len + 1 + paragraph_len <= self.config.max_chars {
                current.push(' ');
                current.push_str(&paragraph);
                current_len += 1 + paragraph_len;
            } else {
                chunks.push(std::mem::replace(&mut current, paragraph));
                current_len = paragraph_len;
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    fn sliding_windows(&self, raw: &str) -> Vec<String> {
        let chars: Vec<char> = normalize_text(raw).chars().collect();
        let stride = self.config.max_chars - self.config.overlap_chars;

        let mut windows = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.config.max_chars).min(chars.len());
            windows.push(chars[start..end].iter().collect::<String>());
            if end == chars.len() {
                break;
            }
            start += stride;
        }

        windows
    }
}
