//! Text-completion backend contract.
//!
//! The completion backend is a black box that turns an ordered transcript into
//! a reply. Everything above it (orchestration, analysis, emotion
//! classification) talks to it through [`CompletionClient`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::Turn;
use crate::error::{MindEaseError, Result};
use crate::language::Language;

/// Sampling parameters forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub top_k: Option<u32>,
    pub top_p: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// One completion round trip: the transcript plus per-request options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    transcript: Vec<Turn>,
    language: Language,
    system_instruction: Option<String>,
    generation: GenerationConfig,
    safety_filters: bool,
}

impl CompletionRequest {
    /// Creates a request for the given transcript.
    ///
    /// Returns `MindEaseError::InvalidInput` when the transcript is empty.
    /// Turn texts are non-blank by construction.
    pub fn new(transcript: Vec<Turn>) -> Result<Self> {
        if transcript.is_empty() {
            return Err(MindEaseError::invalid_input(
                "completion transcript must contain at least one turn",
            ));
        }
        Ok(Self {
            transcript,
            language: Language::default(),
            system_instruction: None,
            generation: GenerationConfig::default(),
            safety_filters: false,
        })
    }

    /// Selects the language whose fallback message accompanies a failure.
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Asks the backend to apply its harm-category filters.
    pub fn with_safety_filters(mut self, enabled: bool) -> Self {
        self.safety_filters = enabled;
        self
    }

    pub fn transcript(&self) -> &[Turn] {
        &self.transcript
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn generation(&self) -> &GenerationConfig {
        &self.generation
    }

    pub fn safety_filters(&self) -> bool {
        self.safety_filters
    }
}

/// Per-language text shown in place of a reply when the backend fails.
///
/// English is mandatory; a language without an entry falls back to English.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackMessages {
    english: String,
    #[serde(default)]
    others: HashMap<Language, String>,
}

impl FallbackMessages {
    pub fn new(english: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            others: HashMap::new(),
        }
    }

    pub fn with(mut self, language: Language, text: impl Into<String>) -> Self {
        if language == Language::English {
            self.english = text.into();
        } else {
            self.others.insert(language, text.into());
        }
        self
    }

    pub fn for_language(&self, language: Language) -> &str {
        match language {
            Language::English => &self.english,
            other => self.others.get(&other).unwrap_or(&self.english),
        }
    }

    /// Builds a [`CompletionError`] carrying the fallback for `language`.
    pub fn error(
        &self,
        language: Language,
        kind: CompletionErrorKind,
        detail: impl Into<String>,
    ) -> CompletionError {
        CompletionError::new(kind, detail, self.for_language(language))
    }
}

/// Why a completion round trip failed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionErrorKind {
    #[error("transport failure")]
    Transport,
    #[error("backend returned HTTP {0}")]
    Status(u16),
    #[error("malformed response body")]
    MalformedBody,
    #[error("response contained no candidate text")]
    NoCandidate,
    #[error("invalid request")]
    InvalidRequest,
}

/// A failed completion, carrying the user-facing fallback text.
///
/// `detail` is a diagnostic for logs; `fallback` is what the user sees.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct CompletionError {
    kind: CompletionErrorKind,
    detail: String,
    fallback: String,
}

impl CompletionError {
    pub fn new(
        kind: CompletionErrorKind,
        detail: impl Into<String>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            detail: detail.into(),
            fallback: fallback.into(),
        }
    }

    pub fn kind(&self) -> CompletionErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

/// Sends a transcript to a text-completion backend and returns the raw reply.
///
/// Implementations perform exactly one request/response round trip: no
/// retries and no timeout beyond the transport default. They never see or
/// mutate the caller's `TurnLog`; they receive a snapshot.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> std::result::Result<String, CompletionError>;
}
