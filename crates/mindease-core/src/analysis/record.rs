//! Analysis record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured assessment of a conversation, as returned by the backend.
///
/// Only [`AnalysisExtractor`](super::AnalysisExtractor) builds these from raw
/// text; deserialization exists for reading persisted records back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub(crate) mood: String,
    pub(crate) problem_solved: bool,
    /// Expected to hold three entries; never empty.
    pub(crate) insights: Vec<String>,
    /// Expected to hold two entries; never empty.
    pub(crate) recommendations: Vec<String>,
}

impl AnalysisRecord {
    pub fn mood(&self) -> &str {
        &self.mood
    }

    pub fn problem_solved(&self) -> bool {
        self.problem_solved
    }

    pub fn insights(&self) -> &[String] {
        &self.insights
    }

    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }
}

/// The persisted form of the most recent analysis for one surface.
///
/// Serialized as `{"analysis": {...}, "timestamp": "<RFC 3339>", "messageCount": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalysis {
    analysis: AnalysisRecord,
    timestamp: DateTime<Utc>,
    /// Transcript length at the instant the analysis request was issued.
    message_count: usize,
}

impl StoredAnalysis {
    pub fn new(analysis: AnalysisRecord, timestamp: DateTime<Utc>, message_count: usize) -> Self {
        Self {
            analysis,
            timestamp,
            message_count,
        }
    }

    pub fn analysis(&self) -> &AnalysisRecord {
        &self.analysis
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }
}
