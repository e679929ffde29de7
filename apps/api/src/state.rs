use std::sync::Arc;

use crate::config::Config;
use crate::matching::scorer::MatchScorer;
use crate::matching::semantic::default_embedder;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Read-only scoring pipeline. The embedder inside loads its model at most once.
    pub scorer: Arc<MatchScorer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let embedder = default_embedder(&config.embedding_model_id);
        let scorer = Arc::new(MatchScorer::new(embedder, config.reference_year));
        Self { config, scorer }
    }
}
