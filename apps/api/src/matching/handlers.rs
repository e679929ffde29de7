//! Axum route handlers for the Match API.

use axum::{
    extract::{rejection::QueryRejection, Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::{extract_text, DocumentFormat};
use crate::matching::scorer::MatchResult;
use crate::state::AppState;

const PDF_SIGNATURE: &[u8] = b"%PDF";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ScoreQuery {
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub use_bert: bool,
    pub top_k: Option<i64>,
}

/// Accepts the usual query-string spellings of a boolean.
fn parse_query_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "f" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_query_flag(&raw).ok_or_else(|| de::Error::custom(format!("invalid boolean '{raw}'")))
}

#[derive(Debug, Serialize)]
pub struct MatchScoreResponse {
    pub score: f64,
    pub top_keywords: Vec<String>,
    pub skills_matched: Vec<String>,
    pub years_experience: f64,
    pub resume_char_count: usize,
    pub job_char_count: usize,
    pub method_used: String,
    pub explanation: Option<String>,
}

impl MatchScoreResponse {
    fn new(result: MatchResult, resume_text: &str, job_text: &str) -> Self {
        let explanation = format!(
            "Score computed using {} method. Skills matched: {}.",
            result.method,
            result.skills_matched.len()
        );
        Self {
            score: result.score,
            top_keywords: result.top_keywords,
            skills_matched: result.skills_matched,
            years_experience: result.years_experience,
            resume_char_count: resume_text.chars().count(),
            job_char_count: job_text.chars().count(),
            method_used: result.method.to_string(),
            explanation: Some(explanation),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub enable_gpt5: bool,
    pub semantic_available: bool,
}

/// Parts of the multipart form we care about.
#[derive(Debug, Default)]
struct ScoreForm {
    resume: Option<(String, Bytes)>,
    job_description: Option<String>,
}

async fn read_score_form(multipart: &mut Multipart) -> Result<ScoreForm, AppError> {
    let mut form = ScoreForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read resume upload: {e}")))?;
                form.resume = Some((filename, data));
            }
            "job_description" => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("Could not read job description: {e}"))
                })?;
                form.job_description = Some(text);
            }
            _ => {}
        }
    }

    Ok(form)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /score
///
/// Multipart form: `resume` (PDF or DOCX file) and `job_description` (text).
/// Query: `use_bert` enables the semantic blend, `top_k` bounds the keyword list.
pub async fn handle_score(
    State(state): State<AppState>,
    query: Result<Query<ScoreQuery>, QueryRejection>,
    mut multipart: Multipart,
) -> Result<Json<MatchScoreResponse>, AppError> {
    let Query(query) =
        query.map_err(|e| AppError::Validation(format!("Invalid query parameters: {e}")))?;
    let form = read_score_form(&mut multipart).await?;

    let (filename, resume_bytes) = form
        .resume
        .ok_or_else(|| AppError::Validation("A resume file is required".to_string()))?;

    let declared = DocumentFormat::from_filename(&filename).ok_or_else(|| {
        AppError::Validation("Only PDF and DOCX files are supported".to_string())
    })?;

    let max_bytes = state.config.max_upload_bytes;
    if resume_bytes.len() > max_bytes {
        return Err(AppError::Validation(format!(
            "File exceeds {} MB size limit",
            max_bytes / (1024 * 1024)
        )));
    }

    if declared == DocumentFormat::Pdf && !resume_bytes.starts_with(PDF_SIGNATURE) {
        return Err(AppError::Validation("Invalid PDF file content".to_string()));
    }

    let job_text = form.job_description.unwrap_or_default();
    if job_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Job description must not be empty".to_string(),
        ));
    }

    let top_k = query
        .top_k
        .map(|k| usize::try_from(k).unwrap_or(0))
        .unwrap_or(state.config.default_top_k);
    let use_semantic = query.use_bert;
    let scorer = state.scorer.clone();

    // Extraction and inference are CPU-bound; keep them off the async workers.
    let (resume_text, detected, result) = tokio::task::spawn_blocking(move || {
        let (resume_text, detected) = extract_text(&resume_bytes, &filename);
        if resume_text.is_empty() {
            return (resume_text, detected, None);
        }
        let result = scorer.compute_match_score(&resume_text, &job_text, use_semantic, top_k);
        (resume_text, detected, Some((result, job_text)))
    })
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    let Some((result, job_text)) = result else {
        return Err(AppError::UnprocessableEntity(format!(
            "Could not extract text from {} file. Ensure file is not corrupted.",
            detected.as_str().to_uppercase()
        )));
    };

    info!(
        format = detected.as_str(),
        method = %result.method,
        score = result.score,
        "Resume scored"
    );

    Ok(Json(MatchScoreResponse::new(result, &resume_text, &job_text)))
}

/// GET /config
///
/// Runtime flags for clients.
pub async fn handle_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        enable_gpt5: state.config.enable_gpt5,
        semantic_available: state.scorer.semantic_available(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_flag_spellings() {
        for raw in ["1", "true", "True", "yes", "on", "t", "Y"] {
            assert_eq!(parse_query_flag(raw), Some(true), "{raw}");
        }
        for raw in ["0", "false", "no", "OFF", "f", "n"] {
            assert_eq!(parse_query_flag(raw), Some(false), "{raw}");
        }
        assert_eq!(parse_query_flag("maybe"), None);
        assert_eq!(parse_query_flag(""), None);
    }
}
