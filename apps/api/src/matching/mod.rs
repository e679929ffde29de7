// Resume ↔ job description matching pipeline.
// normalizer → tfidf / semantic (similarity) ┐
// skills, experience (raw text)             ├→ scorer
// Handlers only validate uploads and call `MatchScorer`.

pub mod experience;
pub mod handlers;
#[cfg(feature = "semantic")]
pub mod local_embedder;
pub mod normalizer;
pub mod scorer;
pub mod semantic;
pub mod similarity;
pub mod skills;
pub mod stemmer;
pub mod stopwords;
pub mod tfidf;
