//! Keyword match scoring.
//!
//! A resume's match percentage is the share of a fixed keyword set that
//! appears, case-insensitively and as a substring, in its extracted skills text.
//! The percentage is truncated, never rounded.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScorerError {
    #[error("keyword set must not be empty")]
    EmptyKeywordSet,
}

/// Scores skills text against a keyword set fixed at construction.
///
/// An empty keyword set is rejected up front, so `score` itself cannot fail.
#[derive(Debug, Clone)]
pub struct MatchScorer {
    keywords: Vec<String>,
    // lowercase copies, matched against lowercased skills text
    needles: Vec<String>,
}

impl MatchScorer {
    pub fn new<I, S>(keywords: I) -> Result<Self, ScorerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords.into_iter().map(Into::into).collect();
        if keywords.is_empty() {
            return Err(ScorerError::EmptyKeywordSet);
        }
        let needles = keywords.iter().map(|k| k.to_lowercase()).collect();
        Ok(Self { keywords, needles })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns `floor(matched / total * 100)`. Absent or empty skills score 0.
    pub fn score(&self, skills: Option<&str>) -> u32 {
        let skills = match skills {
            Some(s) if !s.is_empty() => s.to_lowercase(),
            _ => return 0,
        };
        let matched = self
            .needles
            .iter()
            .filter(|needle| skills.contains(needle.as_str()))
            .count();
        (matched * 100 / self.needles.len()) as u32
    }
}
