//! Similarity Engine: TF-IDF cosine baseline with an optional semantic blend.

use serde::Serialize;

use crate::matching::semantic::{semantic_similarity, SemanticOutcome, SentenceEmbedder};
use crate::matching::tfidf::{TfidfMatrix, MAX_FEATURES};

pub const SEMANTIC_WEIGHT: f64 = 0.6;
pub const TFIDF_WEIGHT: f64 = 0.4;

/// Which similarity path produced a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchMethod {
    #[serde(rename = "tfidf")]
    Tfidf,
    #[serde(rename = "bert+tfidf")]
    SemanticBlend,
    #[serde(rename = "empty")]
    Empty,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Tfidf => "tfidf",
            MatchMethod::SemanticBlend => "bert+tfidf",
            MatchMethod::Empty => "empty",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw inputs to the engine. Normalized texts drive TF-IDF; raw texts feed the embedder.
pub struct SimilarityInput<'a> {
    pub resume_normalized: &'a str,
    pub job_normalized: &'a str,
    pub resume_raw: &'a str,
    pub job_raw: &'a str,
    pub use_semantic: bool,
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
    /// Final score in [0, 100], two decimals.
    pub score: f64,
    pub tfidf_similarity: f64,
    /// `None` when the semantic path was not requested.
    pub semantic: Option<SemanticOutcome>,
    pub top_keywords: Vec<String>,
    pub method: MatchMethod,
}

impl SimilarityResult {
    fn empty() -> Self {
        Self {
            score: 0.0,
            tfidf_similarity: 0.0,
            semantic: None,
            top_keywords: vec![],
            method: MatchMethod::Empty,
        }
    }
}

pub fn compute_similarity(
    input: &SimilarityInput<'_>,
    embedder: &dyn SentenceEmbedder,
) -> SimilarityResult {
    if input.resume_normalized.is_empty() || input.job_normalized.is_empty() {
        return SimilarityResult::empty();
    }

    let matrix = TfidfMatrix::fit(&[input.resume_normalized, input.job_normalized], MAX_FEATURES);
    let tfidf_similarity = matrix.cosine(0, 1);

    let top_keywords = matrix
        .top_terms(1, input.top_k)
        .into_iter()
        .map(|(term, _)| term)
        .collect();

    let semantic = input
        .use_semantic
        .then(|| semantic_similarity(embedder, input.resume_raw, input.job_raw));

    let (similarity, method) = match &semantic {
        Some(SemanticOutcome::Scored(semantic_score)) => (
            SEMANTIC_WEIGHT * semantic_score + TFIDF_WEIGHT * tfidf_similarity,
            MatchMethod::SemanticBlend,
        ),
        _ => (tfidf_similarity, MatchMethod::Tfidf),
    };

    SimilarityResult {
        score: to_percentage(similarity),
        tfidf_similarity,
        semantic,
        top_keywords,
        method,
    }
}

/// Scales a similarity to 0–100, rounded to two decimals.
fn to_percentage(similarity: f64) -> f64 {
    ((similarity * 100.0 * 100.0).round() / 100.0).clamp(0.0, 100.0)
}
