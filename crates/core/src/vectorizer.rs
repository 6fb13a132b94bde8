use crate::error::IndexError;
use crate::stop_words::is_stop_word;
use regex::Regex;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_MAX_FEATURES: usize = 10_000;
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorizerConfig {
    pub max_features: usize,
    pub ngram_range: (usize, usize),
    pub remove_stop_words: bool,
    pub token_pattern: String,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: DEFAULT_MAX_FEATURES,
            ngram_range: (1, 2),
            remove_stop_words: true,
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
        }
    }
}

/// Sparse term weights keyed by vocabulary index, sorted by index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn from_entries(mut entries: Vec<(usize, f64)>) -> Self {
        entries.sort_by_key(|(index, _)| *index);
        entries.retain(|(_, weight)| *weight != 0.0);
        Self { entries }
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn norm(&self) -> f64 {
        self.entries
            .iter()
            .map(|(_, weight)| weight * weight)
            .sum::<f64>()
            .sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut left, mut right) = (0, 0);
        let mut total = 0.0;

        while left < self.entries.len() && right < other.entries.len() {
            let (left_index, left_weight) = self.entries[left];
            let (right_index, right_weight) = other.entries[right];
            match left_index.cmp(&right_index) {
                std::cmp::Ordering::Less => left += 1,
                std::cmp::Ordering::Greater => right += 1,
                std::cmp::Ordering::Equal => {
                    total += left_weight * right_weight;
                    left += 1;
                    right += 1;
                }
            }
        }

        total
    }
}

/// Zero when either side is a zero vector.
pub fn cosine_similarity(left: &SparseVector, right: &SparseVector) -> f64 {
    let denominator = left.norm() * right.norm();
    if denominator == 0.0 {
        return 0.0;
    }
    left.dot(right) / denominator
}

/// Vocabulary and inverse document frequencies fitted on one corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSpace {
    terms: Vec<String>,
    positions: HashMap<String, usize>,
    idf: Vec<f64>,
    document_count: usize,
}

impl VectorSpace {
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.positions.get(term).map(|position| self.idf[*position])
    }

    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

struct TermStats {
    total: usize,
    document_frequency: usize,
    first_seen: usize,
}

pub struct TfIdfVectorizer {
    config: VectorizerConfig,
    token_pattern: Regex,
    space: Option<VectorSpace>,
}

impl TfIdfVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self, IndexError> {
        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(IndexError::InvalidVectorizerConfig(format!(
                "invalid n-gram range ({min_n}, {max_n})"
            )));
        }

        let token_pattern = Regex::new(&config.token_pattern)?;
        Ok(Self {
            config,
            token_pattern,
            space: None,
        })
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn space(&self) -> Option<&VectorSpace> {
        self.space.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.space.is_some()
    }

    /// Lowercased tokens with stop words removed, expanded into the configured n-grams.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&lowered)
            .map(|found| found.as_str())
            .filter(|token| !(self.config.remove_stop_words && is_stop_word(token)))
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    /// Replaces any previous fit. A corpus whose terms are all filtered out still fits, with an
    /// empty vocabulary that maps every text to the zero vector.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<(), IndexError> {
        if corpus.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let mut stats: HashMap<String, TermStats> = HashMap::new();
        for document in corpus {
            let mut seen_in_document: HashSet<String> = HashSet::new();
            for term in self.analyze(document.as_ref()) {
                let next_seen = stats.len();
                let entry = stats.entry(term.clone()).or_insert(TermStats {
                    total: 0,
                    document_frequency: 0,
                    first_seen: next_seen,
                });
                entry.total += 1;
                if seen_in_document.insert(term) {
                    entry.document_frequency += 1;
                }
            }
        }

        let mut ranked: Vec<(String, TermStats)> = stats.into_iter().collect();
        ranked.sort_by(|(left_term, left), (right_term, right)| {
            right
                .total
                .cmp(&left.total)
                .then(left.first_seen.cmp(&right.first_seen))
                .then(left_term.cmp(right_term))
        });
        ranked.truncate(self.config.max_features);
        ranked.sort_by(|(left, _), (right, _)| left.cmp(right));

        let document_count = corpus.len();
        let mut terms = Vec::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (term, term_stats) in ranked {
            idf.push(smoothed_idf(document_count, term_stats.document_frequency));
            terms.push(term);
        }

        let positions = terms
            .iter()
            .enumerate()
            .map(|(position, term)| (term.clone(), position))
            .collect();

        self.space = Some(VectorSpace {
            terms,
            positions,
            idf,
            document_count,
        });
        Ok(())
    }

    /// L2-normalized tf-idf weights over the fitted vocabulary; unknown terms are dropped.
    pub fn transform(&self, text: &str) -> Result<SparseVector, IndexError> {
        let space = self.space.as_ref().ok_or(IndexError::NotFitted)?;

        let mut counts: HashMap<usize, usize> = HashMap::new();
        for term in self.analyze(text) {
            if let Some(position) = space.positions.get(&term) {
                *counts.entry(*position).or_default() += 1;
            }
        }

        let weighted = SparseVector::from_entries(
            counts
                .into_iter()
                .map(|(position, count)| (position, count as f64 * space.idf[position]))
                .collect(),
        );

        let norm = weighted.norm();
        if norm == 0.0 {
            return Ok(SparseVector::default());
        }

        Ok(SparseVector {
            entries: weighted
                .entries
                .into_iter()
                .map(|(position, weight)| (position, weight / norm))
                .collect(),
        })
    }

    pub fn transform_all<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<SparseVector>, IndexError> {
        texts
            .iter()
            .map(|text| self.transform(text.as_ref()))
            .collect()
    }
}

fn smoothed_idf(document_count: usize, document_frequency: usize) -> f64 {
    ((1.0 + document_count as f64) / (1.0 + document_frequency as f64)).ln() + 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(corpus: &[&str]) -> TfIdfVectorizer {
        let mut vectorizer =
            TfIdfVectorizer::new(VectorizerConfig::default()).expect("default config is valid");
        vectorizer.fit(corpus).expect("fit should succeed");
        vectorizer
    }

    #[test]
    fn analyzer_drops_stop_words_before_building_bigrams() {
        let vectorizer = fitted(&["placeholder"]);
        let terms = vectorizer.analyze("The cat sat on the mat.");
        assert_eq!(terms, vec!["cat", "sat", "mat", "cat sat", "sat mat"]);
    }

    #[test]
    fn fitting_an_empty_corpus_fails() {
        let mut vectorizer =
            TfIdfVectorizer::new(VectorizerConfig::default()).expect("default config is valid");
        let corpus: Vec<String> = Vec::new();
        assert!(matches!(vectorizer.fit(corpus.as_slice()), Err(IndexError::EmptyCorpus)));
    }

    #[test]
    fn transform_before_fit_fails() {
        let vectorizer =
            TfIdfVectorizer::new(VectorizerConfig::default()).expect("default config is valid");
        assert!(matches!(vectorizer.transform("cat"), Err(IndexError::NotFitted)));
    }

    #[test]
    fn rarer_terms_get_higher_idf() {
        let vectorizer = fitted(&["pump valve", "pump seal", "pump gasket"]);
        let space = vectorizer.space().expect("fitted");
        let common = space.idf("pump").expect("pump in vocabulary");
        let rare = space.idf("valve").expect("valve in vocabulary");
        assert!((common - 1.0).abs() < 1e-12);
        assert!(rare > common);
    }

    #[test]
    fn vocabulary_is_capped_by_frequency_then_first_seen() {
        let mut vectorizer = TfIdfVectorizer::new(VectorizerConfig {
            max_features: 2,
            ngram_range: (1, 1),
            ..VectorizerConfig::default()
        })
        .expect("config is valid");
        vectorizer
            .fit(&["zebra apple", "mango zebra", "kiwi"])
            .expect("fit should succeed");

        let space = vectorizer.space().expect("fitted");
        assert_eq!(space.terms(), ["apple", "zebra"]);
    }

    #[test]
    fn refitting_the_same_corpus_is_deterministic() {
        let corpus = [
            "Hydraulic pumps move fluid under pressure.",
            "Seals keep hydraulic fluid inside the cylinder.",
            "Pressure relief valves protect the pump.",
        ];
        let first = fitted(&corpus);
        let second = fitted(&corpus);

        assert_eq!(first.space(), second.space());
        let query = "hydraulic pressure";
        assert_eq!(
            first.transform(query).expect("fitted"),
            second.transform(query).expect("fitted")
        );
    }

    #[test]
    fn transformed_vectors_are_unit_length_or_zero() {
        let vectorizer = fitted(&["alpha beta gamma", "beta delta"]);
        let vector = vectorizer.transform("alpha beta beta").expect("fitted");
        assert!((vector.norm() - 1.0).abs() < 1e-9);

        let unknown = vectorizer.transform("unrelated words").expect("fitted");
        assert!(unknown.is_empty());
        assert_eq!(cosine_similarity(&unknown, &vector), 0.0);
    }

    #[test]
    fn stop_word_only_corpus_fits_an_empty_vocabulary() {
        let vectorizer = fitted(&["the and of", "it is"]);
        assert!(vectorizer.space().expect("fitted").is_empty());
        assert!(vectorizer.transform("the").expect("fitted").is_empty());
    }
}
