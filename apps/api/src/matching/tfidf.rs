//! TF-IDF over a small fixed corpus (here: the resume and the job description).
//!
//! Weighting: raw term counts × smoothed idf `ln((1 + n) / (1 + df)) + 1`,
//! each document row L2-normalized.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::stopwords::is_vectorizer_stopword;

pub const MAX_FEATURES: usize = 500;

static TERM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

/// A fitted TF-IDF space: the shared vocabulary plus one normalized row per document.
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    vocabulary: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl TfidfMatrix {
    /// Fits the vocabulary and weights over `documents`.
    pub fn fit(documents: &[&str], max_features: usize) -> Self {
        let counts: Vec<HashMap<String, usize>> =
            documents.iter().map(|doc| count_terms(doc)).collect();

        let vocabulary = select_vocabulary(&counts, max_features);
        let n_docs = documents.len() as f64;

        let idf: Vec<f64> = vocabulary
            .iter()
            .map(|term| {
                let df = counts.iter().filter(|c| c.contains_key(term)).count() as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let rows = counts
            .iter()
            .map(|doc_counts| {
                let mut row: Vec<f64> = vocabulary
                    .iter()
                    .zip(&idf)
                    .map(|(term, idf)| *doc_counts.get(term).unwrap_or(&0) as f64 * idf)
                    .collect();
                l2_normalize(&mut row);
                row
            })
            .collect();

        Self { vocabulary, rows }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Cosine similarity between two document rows; 0.0 when either row is empty.
    pub fn cosine(&self, a: usize, b: usize) -> f64 {
        match (self.row(a), self.row(b)) {
            (Some(a), Some(b)) => cosine_similarity(a, b),
            _ => 0.0,
        }
    }

    /// The `k` highest-weighted terms of a document, strictly positive weights only,
    /// in descending weight order (ties broken alphabetically).
    pub fn top_terms(&self, index: usize, k: usize) -> Vec<(String, f64)> {
        let Some(row) = self.row(index) else {
            return vec![];
        };

        let mut weighted: Vec<(&String, f64)> = self.vocabulary.iter().zip(row.iter().copied()).collect();
        weighted.sort_by(|(ta, wa), (tb, wb)| wb.total_cmp(wa).then_with(|| ta.cmp(tb)));

        weighted
            .into_iter()
            .take(k)
            .filter(|(_, weight)| *weight > 0.0)
            .map(|(term, weight)| (term.clone(), weight))
            .collect()
    }
}

fn count_terms(document: &str) -> HashMap<String, usize> {
    let lowered = document.to_lowercase();
    let mut counts = HashMap::new();
    for m in TERM_RE.find_iter(&lowered) {
        let term = m.as_str();
        if is_vectorizer_stopword(term) {
            continue;
        }
        *counts.entry(term.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Keeps at most `max_features` terms ranked by document frequency, then total
/// count, then alphabetically. The result is sorted alphabetically.
fn select_vocabulary(counts: &[HashMap<String, usize>], max_features: usize) -> Vec<String> {
    let mut stats: HashMap<&str, (usize, usize)> = HashMap::new();
    for doc_counts in counts {
        for (term, count) in doc_counts {
            let entry = stats.entry(term.as_str()).or_insert((0, 0));
            entry.0 += 1;
            entry.1 += count;
        }
    }

    let mut ranked: Vec<(&str, (usize, usize))> = stats.into_iter().collect();
    ranked.sort_by(|(ta, (dfa, tfa)), (tb, (dfb, tfb))| {
        dfb.cmp(dfa).then(tfb.cmp(tfa)).then_with(|| ta.cmp(tb))
    });

    let mut vocabulary: Vec<String> = ranked
        .into_iter()
        .take(max_features)
        .map(|(term, _)| term.to_string())
        .collect();
    vocabulary.sort();
    vocabulary
}

fn l2_normalize(row: &mut [f64]) {
    let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        row.iter_mut().for_each(|w| *w /= norm);
    }
}

/// Cosine similarity of two equal-length vectors; 0.0 if either has zero norm.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_documents_have_similarity_one() {
        let doc = "rust engin build distribut servic";
        let matrix = TfidfMatrix::fit(&[doc, doc], MAX_FEATURES);
        assert!((matrix.cosine(0, 1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_documents_have_similarity_zero() {
        let matrix = TfidfMatrix::fit(&["rust tokio axum", "cook bake roast"], MAX_FEATURES);
        assert_eq!(matrix.cosine(0, 1), 0.0);
    }

    #[test]
    fn test_known_two_document_similarity() {
        // shared "python": idf 1.0; unique terms: idf ln(3/2)+1
        let matrix = TfidfMatrix::fit(&["python rust", "python java"], MAX_FEATURES);
        let unique = (1.5_f64).ln() + 1.0;
        let expected = 1.0 / (1.0 + unique * unique);
        assert!((matrix.cosine(0, 1) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_stopwords_and_single_chars_are_excluded() {
        let matrix = TfidfMatrix::fit(&["the system x python", "python"], MAX_FEATURES);
        assert_eq!(matrix.vocabulary(), &["python".to_string()]);
    }

    #[test]
    fn test_max_features_keeps_shared_terms_first() {
        let matrix = TfidfMatrix::fit(&["alpha beta gamma gamma", "beta delta"], 2);
        // beta has df 2; gamma wins the df-1 tie on count
        assert_eq!(matrix.vocabulary(), &["beta".to_string(), "gamma".to_string()]);
    }

    #[test]
    fn test_top_terms_descending_positive_and_bounded() {
        let matrix = TfidfMatrix::fit(
            &["python docker", "python python kubernet kubernet kubernet aws"],
            MAX_FEATURES,
        );
        let top = matrix.top_terms(1, 10);
        let terms: Vec<&str> = top.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(terms, vec!["kubernet", "python", "aws"]);
        assert!(top.windows(2).all(|w| w[0].1 > w[1].1));
        assert!(top.iter().all(|(_, w)| *w > 0.0));

        assert_eq!(matrix.top_terms(1, 2).len(), 2);
        assert!(matrix.top_terms(1, 0).is_empty());
    }

    #[test]
    fn test_empty_vocabulary_is_harmless() {
        let matrix = TfidfMatrix::fit(&["a b c", "the of"], MAX_FEATURES);
        assert!(matrix.vocabulary().is_empty());
        assert_eq!(matrix.cosine(0, 1), 0.0);
        assert!(matrix.top_terms(1, 5).is_empty());
    }
}
