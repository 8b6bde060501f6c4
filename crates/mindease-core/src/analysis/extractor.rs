//! Extraction of an [`AnalysisRecord`] from a free-text completion.
//!
//! The backend is asked for "JSON only", but replies often arrive wrapped in
//! prose or code fences. The extractor takes the span from the first `{` to the
//! last `}` and parses that. A stray brace inside insight or recommendation
//! text widens or breaks the span; that is accepted behaviour.

use serde_json::{Map, Value};
use thiserror::Error;

use super::record::AnalysisRecord;

/// Why a raw completion could not be turned into an analysis record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No `{ ... }` span exists in the text.
    #[error("no JSON object found in response")]
    NoJsonFound,

    /// The `{ ... }` span is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// The JSON parsed but a required key is missing or has the wrong shape.
    #[error("schema mismatch on '{key}': expected {expected}")]
    SchemaMismatch { key: String, expected: &'static str },
}

impl ExtractionError {
    fn mismatch(key: &str, expected: &'static str) -> Self {
        Self::SchemaMismatch {
            key: key.to_string(),
            expected,
        }
    }

    /// The offending key for a schema mismatch.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::SchemaMismatch { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Returns the inclusive span from the first `{` to the last `}`.
///
/// `None` if either brace is missing or the last `}` precedes the first `{`.
pub fn locate_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Turns raw completion text into a validated [`AnalysisRecord`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisExtractor;

impl AnalysisExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Locates, parses and schema-checks the embedded JSON object.
    ///
    /// Keys are checked in the order `mood`, `problemSolved`, `insights`,
    /// `recommendations`; the first failing key is reported. Extra keys are
    /// ignored.
    pub fn extract(&self, raw: &str) -> Result<AnalysisRecord, ExtractionError> {
        let span = locate_json_object(raw).ok_or(ExtractionError::NoJsonFound)?;

        let value: Value = serde_json::from_str(span)
            .map_err(|e| ExtractionError::MalformedJson(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| ExtractionError::mismatch("<root>", "object"))?;

        let mood = object
            .get("mood")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractionError::mismatch("mood", "string"))?
            .to_string();

        let problem_solved = object
            .get("problemSolved")
            .and_then(Value::as_bool)
            .ok_or_else(|| ExtractionError::mismatch("problemSolved", "boolean"))?;

        let insights = string_list(object, "insights")?;
        let recommendations = string_list(object, "recommendations")?;

        Ok(AnalysisRecord {
            mood,
            problem_solved,
            insights,
            recommendations,
        })
    }
}

fn string_list(object: &Map<String, Value>, key: &str) -> Result<Vec<String>, ExtractionError> {
    const EXPECTED: &str = "non-empty array of strings";

    let items = object
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::mismatch(key, EXPECTED))?;

    if items.is_empty() {
        return Err(ExtractionError::mismatch(key, EXPECTED));
    }

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ExtractionError::mismatch(key, EXPECTED))
        })
        .collect()
}
