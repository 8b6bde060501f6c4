//! Structured conversation analysis.
//!
//! - `record`: `AnalysisRecord` and the persisted `StoredAnalysis` envelope
//! - `extractor`: locating and schema-checking the JSON object in a raw reply
//! - `repository`: persistence trait keyed by surface

mod extractor;
mod record;
mod repository;

pub use extractor::{AnalysisExtractor, ExtractionError, locate_json_object};
pub use record::{AnalysisRecord, StoredAnalysis};
pub use repository::AnalysisRepository;

/// Storage key for the chat surface's analysis.
pub const CHAT_ANALYSIS_KEY: &str = "conversationAnalysis";

/// Storage key for the video surface's analysis.
pub const VIDEO_ANALYSIS_KEY: &str = "videoSessionAnalysis";
