//! Console stand-ins for the speech and camera capabilities.

use std::io::BufRead;

use async_trait::async_trait;
use colored::Colorize;
use futures::StreamExt;
use mindease_core::language::Language;
use mindease_core::media::{MediaDevice, MediaError, MediaHandle, MediaKind};
use mindease_core::speech::{
    SpeechError, SpeechEvent, SpeechInput, SpeechOutput, SpeechStream, VoiceInfo, select_voice,
};

/// Treats each stdin line as a final recognition result.
///
/// An empty line is a session without speech; end of input is a recognition
/// error, which also ends hands-free mode.
pub struct ConsoleSpeechInput;

#[async_trait]
impl SpeechInput for ConsoleSpeechInput {
    async fn start_listening(&self, language: Language) -> Result<SpeechStream, SpeechError> {
        println!(
            "{}",
            format!("🎤 Listening ({})... type what you say:", language.tag()).bright_black()
        );

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line).map(|n| (n, line))
        })
        .await
        .map_err(|e| SpeechError::Recognition(e.to_string()))?
        .map_err(|e| SpeechError::Recognition(e.to_string()))?;

        let events = match line {
            (0, _) => vec![Err(SpeechError::Recognition("end of input".to_string()))],
            (_, text) if text.trim().is_empty() => vec![],
            (_, text) => vec![Ok(SpeechEvent::final_result(text.trim()))],
        };
        Ok(futures::stream::iter(events).boxed())
    }

    async fn stop_listening(&self) {
        tracing::debug!("console recognition stopped");
    }
}

/// Prints what would be spoken, tagged with the chosen voice.
pub struct ConsoleSpeechOutput {
    voices: Vec<VoiceInfo>,
}

impl ConsoleSpeechOutput {
    pub fn new() -> Self {
        Self {
            voices: vec![
                VoiceInfo::new("Console English", "en-US"),
                VoiceInfo::new("Console English Female", "en-GB"),
                VoiceInfo::new("Console Hindi Female", "hi-IN"),
                VoiceInfo::new("Console Tamil", "ta-IN"),
            ],
        }
    }
}

#[async_trait]
impl SpeechOutput for ConsoleSpeechOutput {
    async fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError> {
        let voice = select_voice(&self.voices, language)
            .map(|v| v.name.as_str())
            .unwrap_or("default");
        println!("{} {}", format!("🔊 [{}]", voice).bright_black(), text.bright_blue());
        Ok(())
    }

    async fn cancel(&self) {}
}

/// Pretends to open capture devices.
pub struct SimulatedMedia;

#[async_trait]
impl MediaDevice for SimulatedMedia {
    async fn start(&self, kind: MediaKind) -> Result<MediaHandle, MediaError> {
        let handle = MediaHandle {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
        };
        tracing::debug!(?kind, id = %handle.id, "media track started");
        Ok(handle)
    }

    async fn stop(&self, handle: MediaHandle) {
        tracing::debug!(kind = ?handle.kind, id = %handle.id, "media track stopped");
    }
}
