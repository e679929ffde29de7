pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::warn;

use crate::matching::handlers;
use crate::state::AppState;

/// Room for multipart framing and the job description on top of the file itself.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/config", get(handlers::handle_config))
        .route("/score", post(handlers::handle_score))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{origin}'");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::extraction::fixtures::docx_with_paragraphs;
    use crate::matching::scorer::MatchScorer;
    use crate::matching::semantic::DisabledEmbedder;

    const BOUNDARY: &str = "resume-match-test-boundary";

    fn test_state(overrides: &[(&str, &str)]) -> AppState {
        let overrides: Vec<(String, String)> = overrides
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let config = Config::from_lookup(|key| {
            overrides
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
        .unwrap();
        let embedder = Arc::new(DisabledEmbedder::new("none"));
        AppState {
            config,
            scorer: Arc::new(MatchScorer::new(embedder, Some(2025))),
        }
    }

    fn multipart_body(filename: &str, file: &[u8], job_description: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(file);
        body.extend_from_slice(b"\r\n");
        if let Some(job) = job_description {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\n{job}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_score(state: AppState, uri: &str, body: Vec<u8>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn resume_docx() -> Vec<u8> {
        docx_with_paragraphs(&[
            "Jane Doe",
            "Senior Python developer with 5 years of experience.",
            "Built Django APIs and shipped them with Docker.",
        ])
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(test_state(&[]), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_config_flags() {
        let (status, body) = get_json(test_state(&[("ENABLE_GPT5", "no")]), "/config").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["enable_gpt5"], false);
        assert_eq!(body["semantic_available"], false);
    }

    #[tokio::test]
    async fn test_score_docx_resume() {
        let body = multipart_body(
            "resume.docx",
            &resume_docx(),
            Some("Python engineer to build Django services. Docker a plus."),
        );
        let (status, body) = post_score(test_state(&[]), "/score?use_bert=true&top_k=5", body).await;

        assert_eq!(status, StatusCode::OK, "{body}");
        let score = body["score"].as_f64().unwrap();
        assert!(score > 0.0 && score <= 100.0);
        assert_eq!(body["method_used"], "tfidf");
        assert_eq!(
            body["skills_matched"],
            serde_json::json!(["python", "django", "docker"])
        );
        assert_eq!(body["years_experience"], 5.0);
        assert!(body["top_keywords"].as_array().unwrap().len() <= 5);
        assert_eq!(
            body["explanation"],
            "Score computed using tfidf method. Skills matched: 3."
        );
        assert_eq!(
            body["job_char_count"],
            "Python engineer to build Django services. Docker a plus.".len()
        );
    }

    #[tokio::test]
    async fn test_negative_top_k_returns_no_keywords() {
        let body = multipart_body("resume.docx", &resume_docx(), Some("Python developer"));
        let (status, body) = post_score(test_state(&[]), "/score?top_k=-3", body).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert!(body["top_keywords"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_use_bert_accepts_word_spellings() {
        for flag in ["yes", "1", "on", "no"] {
            let body = multipart_body("resume.docx", &resume_docx(), Some("Python developer"));
            let uri = format!("/score?use_bert={flag}");
            let (status, body) = post_score(test_state(&[]), &uri, body).await;
            assert_eq!(status, StatusCode::OK, "{flag}: {body}");
            assert_eq!(body["method_used"], "tfidf");
        }
    }

    #[tokio::test]
    async fn test_malformed_query_is_validation_error() {
        for uri in ["/score?top_k=abc", "/score?use_bert=maybe"] {
            let body = multipart_body("resume.docx", &resume_docx(), Some("Python developer"));
            let (status, body) = post_score(test_state(&[]), uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert!(body["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid query parameters"));
        }
    }

    #[tokio::test]
    async fn test_rejects_unsupported_extension() {
        let body = multipart_body("resume.txt", b"plain text", Some("Python developer"));
        let (status, body) = post_score(test_state(&[]), "/score", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Only PDF and DOCX files are supported");
    }

    #[tokio::test]
    async fn test_rejects_oversized_file() {
        let body = multipart_body("resume.docx", &resume_docx(), Some("Python developer"));
        let state = test_state(&[("MAX_UPLOAD_BYTES", "16")]);
        let (status, body) = post_score(state, "/score", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_rejects_pdf_without_signature() {
        let body = multipart_body("resume.pdf", b"not really a pdf", Some("Python developer"));
        let (status, body) = post_score(test_state(&[]), "/score", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid PDF file content");
    }

    #[tokio::test]
    async fn test_rejects_blank_job_description() {
        for job in [Some("   "), None] {
            let body = multipart_body("resume.docx", &resume_docx(), job);
            let (status, body) = post_score(test_state(&[]), "/score", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"]["message"], "Job description must not be empty");
        }
    }

    #[tokio::test]
    async fn test_unextractable_resume_is_unprocessable() {
        let body = multipart_body("resume.docx", b"corrupted bytes", Some("Python developer"));
        let (status, body) = post_score(test_state(&[]), "/score", body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .starts_with("Could not extract text from DOCX file"));
    }
}
