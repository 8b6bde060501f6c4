//! Per-message mood classification for the video surface.
//!
//! Each user message is classified by an independent single-turn completion.
//! The result only ever feeds the mood history; failures are logged by the
//! caller and otherwise ignored.

use std::str::FromStr;

use chrono::Utc;
use mindease_core::analysis::locate_json_object;
use mindease_core::completion::{CompletionClient, CompletionError, CompletionRequest, GenerationConfig};
use mindease_core::conversation::Turn;
use mindease_core::language::Language;
use mindease_core::mood::{MAX_INTENSITY, MoodLabel, MoodSample};
use mindease_core::MindEaseError;
use serde::Deserialize;
use thiserror::Error;

use crate::prompts;

#[derive(Error, Debug)]
pub enum EmotionError {
    #[error("classification request failed: {0}")]
    Completion(#[from] CompletionError),
    #[error("could not build classification request: {0}")]
    Request(#[from] MindEaseError),
    #[error("no JSON object in classification reply")]
    NoJsonFound,
    #[error("malformed classification JSON: {0}")]
    MalformedJson(String),
    #[error("unknown mood label '{0}'")]
    UnknownLabel(String),
    #[error("intensity {0} outside 0..=10")]
    IntensityOutOfRange(i64),
}

#[derive(Deserialize)]
struct RawClassification {
    mood: String,
    intensity: f64,
}

#[derive(Debug, Clone)]
pub struct EmotionClassifier {
    generation: GenerationConfig,
}

impl Default for EmotionClassifier {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::new()
                .with_temperature(0.2)
                .with_max_output_tokens(50),
        }
    }
}

impl EmotionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, message: &str, language: Language) -> Result<CompletionRequest, EmotionError> {
        let prompt = Turn::user(prompts::emotion_prompt(message)?)?;
        Ok(CompletionRequest::new(vec![prompt])?
            .with_language(language)
            .with_generation(self.generation.clone()))
    }

    /// Parses `{"mood": "<label>", "intensity": n}` out of a raw reply.
    ///
    /// Fractional intensities are rounded to the nearest integer.
    pub fn parse(&self, raw: &str) -> Result<MoodSample, EmotionError> {
        let span = locate_json_object(raw).ok_or(EmotionError::NoJsonFound)?;
        let parsed: RawClassification =
            serde_json::from_str(span).map_err(|e| EmotionError::MalformedJson(e.to_string()))?;

        let label = MoodLabel::from_str(parsed.mood.trim())
            .map_err(|_| EmotionError::UnknownLabel(parsed.mood.clone()))?;

        let rounded = parsed.intensity.round() as i64;
        if !(0..=i64::from(MAX_INTENSITY)).contains(&rounded) {
            return Err(EmotionError::IntensityOutOfRange(rounded));
        }

        Ok(MoodSample::new(label, rounded as u8, Utc::now())?)
    }

    pub async fn classify(
        &self,
        client: &dyn CompletionClient,
        message: &str,
        language: Language,
    ) -> Result<MoodSample, EmotionError> {
        let request = self.request(message, language)?;
        let raw = client.complete(&request).await?;
        self.parse(&raw)
    }
}
