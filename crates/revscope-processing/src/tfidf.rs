//! TF-IDF document embedding.
//!
//! Matches the defaults of the widely used scikit-learn vectorizer so matrices
//! stay comparable with earlier exports: lowercase, tokens of two or more word
//! characters, smoothed idf `ln((1 + n) / (1 + df)) + 1`, raw counts scaled by
//! idf, and L2-normalized rows. Vocabulary is capped at `max_features` terms by
//! corpus frequency (ties broken alphabetically) and columns are sorted
//! alphabetically.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

/// Dense document-term matrix, one row per input document.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    pub terms: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl EmbeddingMatrix {
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TfidfVectorizer {
    max_features: usize,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl TfidfVectorizer {
    #[must_use]
    pub fn new(max_features: usize) -> Self {
        Self { max_features }
    }

    /// Learns the vocabulary from `docs` and returns their TF-IDF rows.
    ///
    /// A corpus without a single token yields a matrix with no columns.
    #[must_use]
    pub fn fit_transform(&self, docs: &[&str]) -> EmbeddingMatrix {
        let counts: Vec<HashMap<String, usize>> = docs.iter().map(|d| term_counts(d)).collect();

        let mut corpus_tf: HashMap<&str, usize> = HashMap::new();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &counts {
            for (term, n) in doc {
                *corpus_tf.entry(term.as_str()).or_default() += n;
                *doc_freq.entry(term.as_str()).or_default() += 1;
            }
        }

        let mut ranked: Vec<(&str, usize)> = corpus_tf.into_iter().collect();
        ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(self.max_features);

        let vocabulary: BTreeMap<&str, usize> = {
            let mut terms: Vec<&str> = ranked.into_iter().map(|(t, _)| t).collect();
            terms.sort_unstable();
            terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect()
        };

        #[allow(clippy::cast_precision_loss)]
        let n_docs = docs.len() as f64;
        let idf: Vec<f64> = vocabulary
            .keys()
            .map(|term| {
                #[allow(clippy::cast_precision_loss)]
                let df = doc_freq[term] as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows = counts
            .iter()
            .map(|doc| {
                let mut row = vec![0.0; vocabulary.len()];
                for (term, n) in doc {
                    if let Some(&col) = vocabulary.get(term.as_str()) {
                        #[allow(clippy::cast_precision_loss)]
                        let tf = *n as f64;
                        row[col] = tf * idf[col];
                    }
                }
                l2_normalize(&mut row);
                row
            })
            .collect();

        EmbeddingMatrix {
            terms: vocabulary.keys().map(|t| (*t).to_string()).collect(),
            rows,
        }
    }
}

fn term_counts(doc: &str) -> HashMap<String, usize> {
    let lowered = doc.to_lowercase();
    let mut counts = HashMap::new();
    for m in TOKEN_RE.find_iter(&lowered) {
        *counts.entry(m.as_str().to_string()).or_default() += 1;
    }
    counts
}

fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in row.iter_mut() {
            *v /= norm;
        }
    }
}
