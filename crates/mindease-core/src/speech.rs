//! Speech collaborator seams.
//!
//! Recognition and synthesis engines are platform capabilities. The core only
//! sees an event stream for input and a completion future for output.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::language::Language;

/// One recognition result. Interim results may be revised; a final result is
/// equivalent to typed input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechEvent {
    pub transcript: String,
    pub is_final: bool,
}

impl SpeechEvent {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: false,
        }
    }

    pub fn final_result(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            is_final: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("speech capability not supported on this platform")]
    NotSupported,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("recognition error: {0}")]
    Recognition(String),
    #[error("synthesis error: {0}")]
    Synthesis(String),
}

/// Stream of recognition events; an `Err` item is the error channel.
pub type SpeechStream = BoxStream<'static, Result<SpeechEvent, SpeechError>>;

/// Speech-to-text capability.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Starts one recognition session in the given language.
    ///
    /// The stream ends when recognition stops (after a final result, on
    /// silence, or after [`SpeechInput::stop_listening`]).
    async fn start_listening(&self, language: Language) -> Result<SpeechStream, SpeechError>;

    async fn stop_listening(&self);
}

/// Text-to-speech capability.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    /// Speaks `text`; resolves once playback has finished.
    async fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError>;

    /// Stops any current playback.
    async fn cancel(&self);
}

/// A synthesis voice offered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub name: String,
    /// BCP-47 tag, e.g. `hi-IN`.
    pub lang: String,
}

impl VoiceInfo {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Picks a voice for `language`: voices whose tag starts with the language
/// prefix, preferring one with "Female" in its name, else the first match.
pub fn select_voice(voices: &[VoiceInfo], language: Language) -> Option<&VoiceInfo> {
    let prefix = language.prefix();
    let mut matching = voices.iter().filter(|v| v.lang.starts_with(prefix)).peekable();
    let first = *matching.peek()?;
    Some(matching.find(|v| v.name.contains("Female")).unwrap_or(first))
}
