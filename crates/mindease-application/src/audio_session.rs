//! Voice surface: language selection, auto-speak and the hands-free loop.
//!
//! Speech output only decides when listening is re-armed. The transcript is
//! already updated by the time a reply is spoken, and a failed or cancelled
//! playback never touches it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use mindease_core::analysis::AnalysisRepository;
use mindease_core::completion::CompletionClient;
use mindease_core::error::Result;
use mindease_core::language::Language;
use mindease_core::speech::{SpeechError, SpeechInput, SpeechOutput};

use crate::orchestrator::{ConversationOrchestrator, SessionLimits, SubmitOutcome};
use crate::profile::SurfaceProfile;

/// Consecutive empty recognition sessions before hands-free mode gives up.
pub const MAX_SILENT_ROUNDS: usize = 3;

/// Result of one recognition session.
#[derive(Debug)]
pub enum ListenOutcome {
    /// A final transcript was submitted.
    Submitted(SubmitOutcome),
    /// Recognition ended without a final transcript.
    NoSpeech,
}

/// Why the hands-free loop stopped.
#[derive(Debug)]
pub enum HandsFreeStop {
    /// [`AudioSession::stop_hands_free`] was called.
    Requested,
    /// Too many recognition sessions in a row ended without speech.
    Silence,
    Error(SpeechError),
    /// Internal failure while submitting a transcript.
    Failed(mindease_core::MindEaseError),
}

pub struct AudioSession {
    client: Arc<dyn CompletionClient>,
    repository: Arc<dyn AnalysisRepository>,
    speech_in: Arc<dyn SpeechInput>,
    speech_out: Arc<dyn SpeechOutput>,
    limits: SessionLimits,
    orchestrator: ConversationOrchestrator,
    auto_speak: AtomicBool,
    stop_requested: AtomicBool,
}

impl AudioSession {
    /// Mounts the surface in `language` and speaks the welcome message when
    /// auto-speak is on.
    pub async fn mount(
        language: Language,
        client: Arc<dyn CompletionClient>,
        repository: Arc<dyn AnalysisRepository>,
        speech_in: Arc<dyn SpeechInput>,
        speech_out: Arc<dyn SpeechOutput>,
        auto_speak: bool,
    ) -> Result<Self> {
        let orchestrator = ConversationOrchestrator::new(
            SurfaceProfile::audio(language),
            Arc::clone(&client),
            Arc::clone(&repository),
        )?;

        let session = Self {
            client,
            repository,
            speech_in,
            speech_out,
            limits: SessionLimits::unbounded(),
            orchestrator,
            auto_speak: AtomicBool::new(auto_speak),
            stop_requested: AtomicBool::new(false),
        };
        session.speak_greeting().await;
        Ok(session)
    }

    /// Applies limits to the current and every remounted orchestrator.
    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self.orchestrator = self.orchestrator.with_limits(limits);
        self
    }

    pub fn language(&self) -> Language {
        self.orchestrator.language()
    }

    pub fn orchestrator(&self) -> &ConversationOrchestrator {
        &self.orchestrator
    }

    pub fn auto_speak(&self) -> bool {
        self.auto_speak.load(Ordering::SeqCst)
    }

    /// Turning auto-speak off stops any current playback.
    pub async fn set_auto_speak(&self, enabled: bool) {
        self.auto_speak.store(enabled, Ordering::SeqCst);
        if !enabled {
            self.speech_out.cancel().await;
        }
    }

    /// Remounts the surface in `language`: the old transcript is discarded
    /// and a new one starts with that language's welcome message.
    pub async fn switch_language(&mut self, language: Language) -> Result<()> {
        if language == self.language() {
            return Ok(());
        }

        self.speech_in.stop_listening().await;
        self.speech_out.cancel().await;
        self.orchestrator.teardown().await;

        self.orchestrator = ConversationOrchestrator::new(
            SurfaceProfile::audio(language),
            Arc::clone(&self.client),
            Arc::clone(&self.repository),
        )?
        .with_limits(self.limits);

        tracing::info!(language = %language, "audio surface language switched");
        self.speak_greeting().await;
        Ok(())
    }

    /// Submits typed (or recognised) text and speaks the reply.
    pub async fn submit_text(&self, text: &str) -> Result<SubmitOutcome> {
        let outcome = self.orchestrator.submit(text).await?;
        if let Some(reply) = outcome.reply() {
            self.speak(reply).await;
        }
        Ok(outcome)
    }

    /// Runs one recognition session; the first final transcript is submitted.
    pub async fn listen_once(&self) -> std::result::Result<ListenOutcome, HandsFreeStop> {
        let mut events = self
            .speech_in
            .start_listening(self.language())
            .await
            .map_err(HandsFreeStop::Error)?;

        while let Some(event) = events.next().await {
            let event = event.map_err(HandsFreeStop::Error)?;
            if !event.is_final {
                tracing::trace!(transcript = %event.transcript, "interim transcript");
                continue;
            }
            let outcome = self
                .submit_text(&event.transcript)
                .await
                .map_err(HandsFreeStop::Failed)?;
            return Ok(ListenOutcome::Submitted(outcome));
        }

        Ok(ListenOutcome::NoSpeech)
    }

    /// Listens, submits, speaks the reply and re-arms until stopped or a
    /// recognition error occurs. Returns the number of submitted transcripts
    /// with the reason the loop ended.
    pub async fn run_hands_free(&self) -> (usize, HandsFreeStop) {
        self.stop_requested.store(false, Ordering::SeqCst);
        let mut submitted = 0;
        let mut silent = 0;

        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                return (submitted, HandsFreeStop::Requested);
            }
            match self.listen_once().await {
                Ok(ListenOutcome::Submitted(_)) => {
                    submitted += 1;
                    silent = 0;
                }
                Ok(ListenOutcome::NoSpeech) => {
                    silent += 1;
                    if silent >= MAX_SILENT_ROUNDS {
                        return (submitted, HandsFreeStop::Silence);
                    }
                }
                Err(stop) => {
                    tracing::warn!(?stop, "hands-free listening stopped");
                    return (submitted, stop);
                }
            }
        }
    }

    /// Stops the hands-free loop after the current recognition session.
    pub async fn stop_hands_free(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.speech_in.stop_listening().await;
    }

    pub async fn unmount(&self) {
        self.speech_in.stop_listening().await;
        self.speech_out.cancel().await;
        self.orchestrator.teardown().await;
    }

    async fn speak_greeting(&self) {
        let greeting = self.orchestrator.profile().greeting().to_string();
        self.speak(&greeting).await;
    }

    async fn speak(&self, text: &str) {
        if !self.auto_speak() {
            return;
        }
        self.speech_out.cancel().await;
        if let Err(e) = self.speech_out.speak(text, self.language()).await {
            tracing::warn!(error = %e, "speech synthesis failed");
        }
    }
}
