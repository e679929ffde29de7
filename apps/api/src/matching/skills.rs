//! Skill Detector: heuristic matching against a fixed technical-skill vocabulary.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Ordered (label, pattern) pairs. Detection order follows this table.
const SKILL_PATTERNS: &[(&str, &str)] = &[
    ("python", r"\bpython\b"),
    ("java", r"\bjava\b"),
    ("javascript", r"\bjavascript\b|js(?:\s|$)"),
    ("typescript", r"\btypescript\b"),
    ("react", r"\breact\b"),
    ("fastapi", r"\bfastapi\b"),
    ("django", r"\bdjango\b"),
    ("sql", r"\bsql\b"),
    ("mongodb", r"\bmongodb\b"),
    ("aws", r"\baws\b"),
    ("docker", r"\bdocker\b"),
    ("kubernetes", r"\bkubernetes\b|k8s"),
    ("git", r"\bgit\b"),
    ("machine learning", r"\bmachine\s+learning\b|ml(?:\s|$)"),
    ("deep learning", r"\bdeep\s+learning\b"),
    ("nlp", r"\bnlp\b|natural\s+language\s+processing"),
    ("bert", r"\bbert\b"),
    ("tensorflow", r"\btensorflow\b"),
    ("pytorch", r"\bpytorch\b"),
    ("scikit-learn", r"\bscikit.learn\b|sklearn"),
    ("rest api", r"\brest\b|restful\b"),
    ("gcp", r"\bgcp\b|google\s+cloud"),
];

/// A compiled, immutable skill vocabulary.
pub struct SkillVocabulary {
    entries: Vec<(&'static str, Regex)>,
}

impl SkillVocabulary {
    fn compile() -> Self {
        let entries = SKILL_PATTERNS
            .iter()
            .map(|&(label, pattern)| {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .unwrap();
                (label, regex)
            })
            .collect();
        Self { entries }
    }

    #[cfg(test)]
    fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(label, _)| *label)
    }

    /// Labels whose pattern matches anywhere in `text`, in vocabulary order.
    pub fn detect(&self, text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(label, _)| label.to_string())
            .collect()
    }
}

/// Process-wide vocabulary, compiled on first use.
pub static SKILL_VOCABULARY: Lazy<SkillVocabulary> = Lazy::new(SkillVocabulary::compile);

pub fn detect_skills(text: &str) -> Vec<String> {
    SKILL_VOCABULARY.detect(text)
}

/// Skills detected in the resume that the job also asks for, in resume order.
pub fn match_skills(resume_text: &str, job_text: &str) -> Vec<String> {
    let job_skills: HashSet<String> = detect_skills(job_text).into_iter().collect();
    let mut seen = HashSet::new();

    detect_skills(resume_text)
        .into_iter()
        .filter(|skill| job_skills.contains(skill))
        .filter(|skill| seen.insert(skill.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_compiles_all_patterns() {
        assert_eq!(SKILL_VOCABULARY.labels().count(), 22);
    }

    #[test]
    fn test_detection_is_case_insensitive() {
        for text in ["Python", "PYTHON", "python"] {
            assert_eq!(detect_skills(text), vec!["python"], "text: {text}");
        }
    }

    #[test]
    fn test_aliases() {
        assert!(detect_skills("Ran clusters on k8s").contains(&"kubernetes".to_string()));
        assert!(detect_skills("Applied ML to ranking").contains(&"machine learning".to_string()));
        assert!(detect_skills("Used sklearn pipelines").contains(&"scikit-learn".to_string()));
        assert!(detect_skills("Deployed on Google Cloud").contains(&"gcp".to_string()));
        assert!(detect_skills("Built RESTful services").contains(&"rest api".to_string()));
    }

    #[test]
    fn test_word_boundaries() {
        // "javascript" must not also report "java"
        let skills = detect_skills("Expert in JavaScript");
        assert_eq!(skills, vec!["javascript"]);
        assert!(detect_skills("github actions").is_empty());
    }

    #[test]
    fn test_results_follow_vocabulary_order() {
        let skills = detect_skills("Docker, then SQL, then Python");
        assert_eq!(skills, vec!["python", "sql", "docker"]);
    }

    #[test]
    fn test_no_skills() {
        assert!(detect_skills("").is_empty());
        assert!(detect_skills("Excellent communicator and team player").is_empty());
    }

    #[test]
    fn test_matched_skills_are_intersection_in_resume_order() {
        let resume = "Docker and Python developer with AWS and React experience";
        let job = "We need React, Python, and Kubernetes";
        let matched = match_skills(resume, job);
        assert_eq!(matched, vec!["python", "react"]);

        let resume_skills = detect_skills(resume);
        let job_skills = detect_skills(job);
        for skill in &matched {
            assert!(resume_skills.contains(skill));
            assert!(job_skills.contains(skill));
        }
    }

    #[test]
    fn test_matched_skills_empty_when_job_has_none() {
        assert!(match_skills("Python, SQL", "Friendly barista wanted").is_empty());
    }
}
