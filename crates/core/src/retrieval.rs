use crate::chunking::normalize_text;
use crate::error::IndexError;
use crate::models::{Chunk, SearchOptions};
use crate::vectorizer::{cosine_similarity, TfIdfVectorizer};
use serde::Serialize;

const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub corpus_index: usize,
    pub similarity: f64,
    pub text: String,
}

pub fn search(
    query: &str,
    chunks: &[Chunk],
    vectorizer: &TfIdfVectorizer,
    options: &SearchOptions,
) -> Result<Vec<String>, IndexError> {
    Ok(search_scored(query, chunks, vectorizer, options)?
        .into_iter()
        .map(|hit| hit.text)
        .collect())
}

/// Ranks every chunk against the query and returns the selected hits in corpus order.
///
/// Document vectors are recomputed on every call.
pub fn search_scored(
    query: &str,
    chunks: &[Chunk],
    vectorizer: &TfIdfVectorizer,
    options: &SearchOptions,
) -> Result<Vec<RetrievedChunk>, IndexError> {
    if chunks.is_empty() {
        return Err(IndexError::EmptyIndex);
    }
    validate_options(options)?;

    let query_vector = vectorizer.transform(&normalize_text(query))?;
    let similarities = chunks
        .iter()
        .map(|chunk| {
            vectorizer
                .transform(&chunk.text)
                .map(|document_vector| cosine_similarity(&query_vector, &document_vector))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(select_positions(&similarities, options)
        .into_iter()
        .map(|position| RetrievedChunk {
            corpus_index: chunks[position].corpus_index,
            similarity: similarities[position],
            text: truncate_chunk(&chunks[position].text, options.max_chunk_chars),
        })
        .collect())
}

/// Top-k by similarity (ties to the earlier position), kept only above the floor unless that
/// leaves nothing, then put back into ascending position order.
pub fn select_positions(similarities: &[f64], options: &SearchOptions) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..similarities.len()).collect();
    ranked.sort_by(|left, right| {
        similarities[*right]
            .total_cmp(&similarities[*left])
            .then(left.cmp(right))
    });
    ranked.truncate(options.top_k);

    let above_floor: Vec<usize> = ranked
        .iter()
        .copied()
        .filter(|position| similarities[*position] > options.min_similarity)
        .collect();

    let mut selected = if above_floor.is_empty() {
        ranked
    } else {
        above_floor
    };
    selected.sort_unstable();
    selected
}

/// Cuts text longer than `max_chars` characters at the last period inside the limit, or hard
/// cuts it and appends an ellipsis when there is none.
pub fn truncate_chunk(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let prefix = &text[..cut];
    match prefix.rfind('.') {
        Some(period) => prefix[..=period].to_string(),
        None => format!("{prefix}{ELLIPSIS}"),
    }
}

fn validate_options(options: &SearchOptions) -> Result<(), IndexError> {
    if options.top_k == 0 {
        return Err(IndexError::InvalidSearchOptions(
            "top_k must be at least 1".to_string(),
        ));
    }

    if options.max_chunk_chars == 0 {
        return Err(IndexError::InvalidSearchOptions(
            "max_chunk_chars must be at least 1".to_string(),
        ));
    }

    if options.min_similarity.is_nan() {
        return Err(IndexError::InvalidSearchOptions(
            "min_similarity must be a number".to_string(),
        ));
    }

    Ok(())
}
