use anyhow::{Context, Result};

use crate::matching::semantic::DEFAULT_MODEL_ID;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_TOP_K: usize = 10;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    pub default_top_k: usize,
    pub embedding_model_id: String,
    /// Year standing in for "present" in resume date ranges. `None` = current year.
    pub reference_year: Option<i32>,
    pub cors_allowed_origins: Vec<String>,
    pub enable_gpt5: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PORT") {
            Some(v) => v.parse::<u16>().context("PORT must be a valid port number")?,
            None => 8080,
        };
        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse::<usize>()
                .context("MAX_UPLOAD_BYTES must be a non-negative integer")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let default_top_k = match lookup("DEFAULT_TOP_K") {
            Some(v) => v
                .parse::<usize>()
                .context("DEFAULT_TOP_K must be a non-negative integer")?,
            None => DEFAULT_TOP_K,
        };
        let reference_year = lookup("REFERENCE_YEAR")
            .map(|v| v.parse::<i32>().context("REFERENCE_YEAR must be a year, e.g. 2025"))
            .transpose()?;

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Config {
            port,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            max_upload_bytes,
            default_top_k,
            embedding_model_id: lookup("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            reference_year,
            cors_allowed_origins,
            enable_gpt5: lookup("ENABLE_GPT5")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        })
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.default_top_k, 10);
        assert_eq!(config.embedding_model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.reference_year, None);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://localhost:3000", "http://127.0.0.1:3000"]
        );
        assert!(config.enable_gpt5);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("REFERENCE_YEAR", "2030"),
            ("DEFAULT_TOP_K", "3"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("ENABLE_GPT5", "off"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.reference_year, Some(2030));
        assert_eq!(config.default_top_k, 3);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.enable_gpt5);
    }

    #[test]
    fn test_invalid_values_fail() {
        assert!(config_from(&[("PORT", "not-a-port")]).is_err());
        assert!(config_from(&[("REFERENCE_YEAR", "soon")]).is_err());
        assert!(config_from(&[("MAX_UPLOAD_BYTES", "-1")]).is_err());
    }

    #[test]
    fn test_parse_flag() {
        for v in ["1", "true", "YES", " on "] {
            assert!(parse_flag(v), "{v}");
        }
        for v in ["0", "false", "nope", ""] {
            assert!(!parse_flag(v), "{v}");
        }
    }
}
