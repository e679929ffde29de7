//! Semantic similarity: pluggable sentence-embedding backends.
//!
//! `AppState` carries an `Arc<dyn SentenceEmbedder>`; which backend it is gets
//! decided at startup by the `semantic` cargo feature. Failures never escape:
//! `semantic_similarity` turns them into `SemanticOutcome::Fallback`.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

#[cfg(feature = "semantic")]
use crate::matching::local_embedder::LocalEmbedder;

pub const DEFAULT_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("Embedding inference failed: {0}")]
    Inference(String),

    #[error("Embedding dimension mismatch: {0} vs {1}")]
    Dimension(usize, usize),
}

/// Maps text to a fixed-size vector. Implement this to swap backends.
pub trait SentenceEmbedder: Send + Sync {
    fn model_id(&self) -> &str;

    /// Whether this backend can produce embeddings at all in this build.
    fn is_available(&self) -> bool {
        true
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Result of the optional semantic path.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    /// Cosine similarity of the two embeddings.
    Scored(f64),
    /// The semantic path could not run; the reason is kept for logs and tests.
    Fallback(String),
}

/// Embeds both raw texts and returns their cosine similarity, or the reason it failed.
pub fn semantic_similarity(
    embedder: &dyn SentenceEmbedder,
    resume_text: &str,
    job_text: &str,
) -> SemanticOutcome {
    match embed_pair(embedder, resume_text, job_text) {
        Ok(similarity) => SemanticOutcome::Scored(similarity),
        Err(e) => {
            warn!(model = embedder.model_id(), "Semantic similarity unavailable, using TF-IDF only: {e}");
            SemanticOutcome::Fallback(e.to_string())
        }
    }
}

fn embed_pair(
    embedder: &dyn SentenceEmbedder,
    resume_text: &str,
    job_text: &str,
) -> Result<f64, EmbeddingError> {
    let resume = embedder.embed(resume_text)?;
    let job = embedder.embed(job_text)?;
    if resume.len() != job.len() {
        return Err(EmbeddingError::Dimension(resume.len(), job.len()));
    }

    let dot: f64 = resume.iter().zip(&job).map(|(a, b)| f64::from(*a) * f64::from(*b)).sum();
    let norm_resume = resume.iter().map(|a| f64::from(*a).powi(2)).sum::<f64>().sqrt();
    let norm_job = job.iter().map(|b| f64::from(*b).powi(2)).sum::<f64>().sqrt();
    if norm_resume == 0.0 || norm_job == 0.0 {
        return Err(EmbeddingError::Inference("zero-norm embedding".to_string()));
    }
    let similarity = dot / (norm_resume * norm_job);
    if !similarity.is_finite() {
        return Err(EmbeddingError::Inference("non-finite similarity".to_string()));
    }
    Ok(similarity)
}

// ────────────────────────────────────────────────────────────────────────────
// Backends
// ────────────────────────────────────────────────────────────────────────────

/// Used when the service is built without the `semantic` feature.
pub struct DisabledEmbedder {
    model_id: String,
}

impl DisabledEmbedder {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

impl SentenceEmbedder for DisabledEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn is_available(&self) -> bool {
        false
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Unavailable(
            "service built without the `semantic` feature".to_string(),
        ))
    }
}

/// Loads the wrapped backend on first use and keeps it for the life of the process.
/// A failed load is not cached, so the next request retries.
pub struct LazyEmbedder<E> {
    model_id: String,
    loader: fn(&str) -> Result<E, EmbeddingError>,
    loaded: Mutex<Option<Arc<E>>>,
}

impl<E: SentenceEmbedder> LazyEmbedder<E> {
    pub fn new(model_id: impl Into<String>, loader: fn(&str) -> Result<E, EmbeddingError>) -> Self {
        Self {
            model_id: model_id.into(),
            loader,
            loaded: Mutex::new(None),
        }
    }

    fn get(&self) -> Result<Arc<E>, EmbeddingError> {
        let mut slot = self
            .loaded
            .lock()
            .map_err(|_| EmbeddingError::Unavailable("embedder lock poisoned".to_string()))?;

        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        info!(model = %self.model_id, "Loading embedding model");
        let model = Arc::new((self.loader)(&self.model_id)?);
        *slot = Some(Arc::clone(&model));
        info!(model = %self.model_id, "Embedding model loaded");
        Ok(model)
    }
}

impl<E: SentenceEmbedder> SentenceEmbedder for LazyEmbedder<E> {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.get()?.embed(text)
    }
}

/// Picks the embedding backend compiled into this build.
pub fn default_embedder(model_id: &str) -> Arc<dyn SentenceEmbedder> {
    #[cfg(feature = "semantic")]
    {
        Arc::new(LazyEmbedder::new(model_id, LocalEmbedder::load))
    }
    #[cfg(not(feature = "semantic"))]
    {
        Arc::new(DisabledEmbedder::new(model_id))
    }
}
