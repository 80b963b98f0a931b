//! Vocabulary payload parsing.
//!
//! # Responsibility
//! - Extract the JSON vocabulary list from lesson-generator output.
//! - Normalize entries before they become cards.
//!
//! # Invariants
//! - Returned items have non-empty, trimmed words.
//! - Words are unique per payload, compared case-insensitively; first wins.

use crate::model::card::CardContent;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

static JSON_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)```json\s*(.*?)```").expect("valid json fence regex"));
static ANY_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)```").expect("valid fence regex"));

/// One extracted vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabItem {
    pub word: String,
    #[serde(rename = "trans", alias = "translation", default)]
    pub translation: String,
}

impl VocabItem {
    pub fn new(word: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            translation: translation.into(),
        }
    }

    pub fn into_content(self) -> CardContent {
        CardContent::new(self.word, self.translation)
    }
}

#[derive(Debug)]
pub enum VocabParseError {
    /// No JSON list could be located in the payload.
    Empty,
    Json(serde_json::Error),
}

impl Display for VocabParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "vocabulary payload is empty"),
            Self::Json(err) => write!(f, "vocabulary payload is not a JSON list: {err}"),
        }
    }
}

impl Error for VocabParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Empty => None,
            Self::Json(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for VocabParseError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Parses a `[{"word": .., "trans": ..}]` list, optionally wrapped in a
/// markdown code fence or surrounded by prose.
pub fn parse_vocab_payload(text: &str) -> Result<Vec<VocabItem>, VocabParseError> {
    let body = extract_json_body(text);
    if body.is_empty() {
        return Err(VocabParseError::Empty);
    }

    let raw: Vec<VocabItem> = serde_json::from_str(body)?;
    let mut seen = HashSet::new();
    let items = raw
        .into_iter()
        .filter_map(|item| {
            let word = item.word.trim();
            if word.is_empty() || !seen.insert(word.to_lowercase()) {
                return None;
            }
            Some(VocabItem::new(word, item.translation.trim()))
        })
        .collect();
    Ok(items)
}

fn extract_json_body(text: &str) -> &str {
    let fenced = JSON_FENCE_RE
        .captures(text)
        .or_else(|| ANY_FENCE_RE.captures(text))
        .and_then(|captures| captures.get(1));
    if let Some(body) = fenced {
        return body.as_str().trim();
    }

    let trimmed = text.trim();
    if trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::extract_json_body;

    #[test]
    fn json_fence_wins_over_plain_fence() {
        let text = "```\nignored\n```\n```json\n[1]\n```";
        assert_eq!(extract_json_body(text), "[1]");
    }

    #[test]
    fn prose_around_list_is_stripped() {
        assert_eq!(extract_json_body("Here you go: [1, 2] enjoy"), "[1, 2]");
    }
}
