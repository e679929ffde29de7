//! Score Aggregator: the single entry point of the matching pipeline.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Serialize;
use tracing::debug;

use crate::matching::experience::estimate_experience;
use crate::matching::normalizer::normalize;
use crate::matching::semantic::SentenceEmbedder;
use crate::matching::similarity::{compute_similarity, MatchMethod, SimilarityInput};
use crate::matching::skills::match_skills;

/// Output of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub score: f64,                 // 0 – 100
    pub top_keywords: Vec<String>,  // descending TF-IDF weight in the JD
    pub skills_matched: Vec<String>,
    pub years_experience: f64,      // 0 – 50
    pub method: MatchMethod,
}

impl MatchResult {
    fn empty() -> Self {
        Self {
            score: 0.0,
            top_keywords: vec![],
            skills_matched: vec![],
            years_experience: 0.0,
            method: MatchMethod::Empty,
        }
    }
}

/// Scores resumes against job descriptions.
///
/// Holds only read-only collaborators, so one instance is shared by every request.
#[derive(Clone)]
pub struct MatchScorer {
    embedder: Arc<dyn SentenceEmbedder>,
    /// Year used for "present" in date ranges; `None` means the current year.
    reference_year: Option<i32>,
}

impl MatchScorer {
    pub fn new(embedder: Arc<dyn SentenceEmbedder>, reference_year: Option<i32>) -> Self {
        Self {
            embedder,
            reference_year,
        }
    }

    pub fn semantic_available(&self) -> bool {
        self.embedder.is_available()
    }

    fn reference_year(&self) -> i32 {
        self.reference_year.unwrap_or_else(|| Utc::now().year())
    }

    pub fn compute_match_score(
        &self,
        resume_text: &str,
        job_text: &str,
        use_semantic: bool,
        top_k: usize,
    ) -> MatchResult {
        let resume_normalized = normalize(resume_text);
        let job_normalized = normalize(job_text);

        if resume_normalized.is_empty() || job_normalized.is_empty() {
            debug!("Empty text after normalization; returning empty result");
            return MatchResult::empty();
        }

        let similarity = compute_similarity(
            &SimilarityInput {
                resume_normalized: &resume_normalized,
                job_normalized: &job_normalized,
                resume_raw: resume_text,
                job_raw: job_text,
                use_semantic,
                top_k,
            },
            self.embedder.as_ref(),
        );

        let skills_matched = match_skills(resume_text, job_text);
        let experience = estimate_experience(resume_text, self.reference_year());

        debug!(
            method = %similarity.method,
            score = similarity.score,
            tfidf = similarity.tfidf_similarity,
            skills = skills_matched.len(),
            years = experience.years,
            "Match scored"
        );

        MatchResult {
            score: similarity.score,
            top_keywords: similarity.top_keywords,
            skills_matched,
            years_experience: experience.years,
            method: similarity.method,
        }
    }
}
