//! Experience Estimator: years of experience from raw resume text.
//!
//! Strategies are tried in a fixed order; the first one that yields a positive
//! value wins:
//! 1. `ExplicitStatement`: "5+ years of experience", "experience: 7 years"
//! 2. `DateRange`: "Jan 2019 - Mar 2022", "2021 - present"
//! 3. `SeniorityKeyword`: title keywords mapped to conservative estimates

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub const MAX_YEARS: f64 = 50.0;

const MONTH: &str = "(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)";

static EXPLICIT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(\d+)\+?\s+years?\s+(?:of\s+)?(?:professional\s+)?experience",
        r"total\s+experience:?\s*(\d+)\+?\s+years?",
        r"experience:?\s*(\d+)\+?\s+years?",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{MONTH}?\.?\s*(\d{{4}})\s*[-–]\s*{MONTH}?\.?\s*(\d{{4}})"
    ))
    .unwrap()
});

static OPEN_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})\s*[-–]\s*(?:present|current|now|ongoing)").unwrap()
});

static JOB_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{MONTH}.*?\d{{4}}|(?:job|position|role|worked|employed)"
    ))
    .unwrap()
});

/// Seniority tiers in priority order.
const SENIORITY_TIERS: &[(&[&str], f64)] = &[
    (&["principal", "director", "vp ", "vice president"], 15.0),
    (&["senior", "lead", "architect", "staff"], 7.0),
    (&["mid-level", "mid level", "intermediate", "specialist"], 4.0),
    (&["junior", "entry", "graduate", "intern", "trainee"], 1.0),
];

/// One tier of the estimation fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceStrategy {
    ExplicitStatement,
    DateRange,
    SeniorityKeyword,
}

impl ExperienceStrategy {
    pub const ORDER: [ExperienceStrategy; 3] = [
        ExperienceStrategy::ExplicitStatement,
        ExperienceStrategy::DateRange,
        ExperienceStrategy::SeniorityKeyword,
    ];

    /// Runs this tier against already-lowercased text.
    pub fn estimate(self, text_lower: &str, reference_year: i32) -> Option<f64> {
        match self {
            ExperienceStrategy::ExplicitStatement => explicit_statement(text_lower),
            ExperienceStrategy::DateRange => date_ranges(text_lower, reference_year),
            ExperienceStrategy::SeniorityKeyword => seniority_keyword(text_lower),
        }
    }
}

/// An estimate together with the tier that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExperienceEstimate {
    pub years: f64,
    pub strategy: Option<ExperienceStrategy>,
}

/// Estimates years of experience. `reference_year` stands in for "present".
pub fn estimate_experience(text: &str, reference_year: i32) -> ExperienceEstimate {
    let text_lower = text.to_lowercase();

    for strategy in ExperienceStrategy::ORDER {
        if let Some(years) = strategy.estimate(&text_lower, reference_year) {
            if years > 0.0 {
                debug!(?strategy, years, "Experience estimated");
                return ExperienceEstimate {
                    years: years.clamp(0.0, MAX_YEARS),
                    strategy: Some(strategy),
                };
            }
        }
    }

    ExperienceEstimate {
        years: 0.0,
        strategy: None,
    }
}

fn explicit_statement(text: &str) -> Option<f64> {
    let years: Vec<f64> = EXPLICIT_PATTERNS
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
        .map(f64::from)
        .collect();

    if years.is_empty() {
        return None;
    }
    let mean = years.iter().sum::<f64>() / years.len() as f64;
    Some(mean.min(MAX_YEARS))
}

fn date_ranges(text: &str, reference_year: i32) -> Option<f64> {
    let closed = YEAR_RANGE_RE.captures_iter(text).filter_map(|caps| {
        let start = caps.get(1)?.as_str().parse::<i32>().ok()?;
        let end = caps.get(2)?.as_str().parse::<i32>().ok()?;
        Some((start, end))
    });
    let open = OPEN_RANGE_RE.captures_iter(text).filter_map(|caps| {
        let start = caps.get(1)?.as_str().parse::<i32>().ok()?;
        Some((start, reference_year))
    });

    let total: i32 = closed
        .chain(open)
        .map(|(start, end)| end - start)
        .filter(|duration| (0..=MAX_YEARS as i32).contains(duration))
        .sum();

    if total <= 0 {
        return None;
    }

    let job_count = JOB_MARKER_RE.find_iter(text).count();
    let years = if job_count > 0 {
        f64::from(total) / job_count as f64
    } else {
        f64::from(total)
    };
    Some(years.min(MAX_YEARS))
}

fn seniority_keyword(text: &str) -> Option<f64> {
    SENIORITY_TIERS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(_, years)| *years)
}
