//! Simulated video therapy call.
//!
//! Call lifecycle is `NotStarted -> Connecting -> Active -> Ended`. Camera and
//! microphone state is tracked for display only; it never reaches the
//! transcript.

use std::sync::Arc;
use std::time::Duration;

use mindease_core::MindEaseError;
use mindease_core::analysis::AnalysisRepository;
use mindease_core::completion::CompletionClient;
use mindease_core::error::Result;
use mindease_core::media::{MediaDevice, MediaError, MediaHandle, MediaKind};
use mindease_core::mood::MoodHistory;

use crate::orchestrator::{AnalysisOutcome, ConversationOrchestrator, SessionLimits, SubmitOutcome};
use crate::profile::SurfaceProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    NotStarted,
    Connecting,
    Active,
    Ended,
}

/// Snapshot of the media controls for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaState {
    pub camera_on: bool,
    pub microphone_on: bool,
    pub muted: bool,
}

pub struct VideoSession {
    client: Arc<dyn CompletionClient>,
    repository: Arc<dyn AnalysisRepository>,
    media: Arc<dyn MediaDevice>,
    limits: SessionLimits,
    connect_delay: Duration,
    status: CallStatus,
    orchestrator: Option<ConversationOrchestrator>,
    camera: Option<MediaHandle>,
    microphone: Option<MediaHandle>,
    muted: bool,
}

impl VideoSession {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        repository: Arc<dyn AnalysisRepository>,
        media: Arc<dyn MediaDevice>,
    ) -> Self {
        Self {
            client,
            repository,
            media,
            limits: SessionLimits::unbounded(),
            connect_delay: Duration::ZERO,
            status: CallStatus::NotStarted,
            orchestrator: None,
            camera: None,
            microphone: None,
            muted: false,
        }
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Simulated time spent in `Connecting`.
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn status(&self) -> CallStatus {
        self.status
    }

    pub fn media_state(&self) -> MediaState {
        MediaState {
            camera_on: self.camera.is_some(),
            microphone_on: self.microphone.is_some(),
            muted: self.muted,
        }
    }

    pub fn orchestrator(&self) -> Option<&ConversationOrchestrator> {
        self.orchestrator.as_ref()
    }

    /// Connects, seeds the therapist greeting and turns the camera on.
    ///
    /// A camera failure leaves the call active with the camera off; the error
    /// is returned so the caller can tell the user.
    pub async fn start_call(&mut self) -> Result<Option<MediaError>> {
        if self.status != CallStatus::NotStarted {
            return Err(MindEaseError::invalid_input("call already started"));
        }

        self.status = CallStatus::Connecting;
        tracing::info!("video call connecting");
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let orchestrator = ConversationOrchestrator::new(
            SurfaceProfile::video(),
            Arc::clone(&self.client),
            Arc::clone(&self.repository),
        )?
        .with_limits(self.limits);
        self.orchestrator = Some(orchestrator);
        self.status = CallStatus::Active;
        tracing::info!("video call active");

        Ok(self.toggle_camera().await.err())
    }

    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome> {
        self.active()?.submit(text).await
    }

    /// Operator-invoked session analysis.
    pub async fn analyze(&self) -> Result<AnalysisOutcome> {
        Ok(self.active()?.analyze().await)
    }

    pub async fn mood_history(&self) -> MoodHistory {
        match &self.orchestrator {
            Some(orchestrator) => orchestrator.mood_history().await,
            None => MoodHistory::default(),
        }
    }

    /// Returns whether the camera is now on.
    pub async fn toggle_camera(&mut self) -> std::result::Result<bool, MediaError> {
        Self::toggle(self.media.as_ref(), &mut self.camera, MediaKind::Camera).await
    }

    /// Returns whether the microphone is now on.
    pub async fn toggle_microphone(&mut self) -> std::result::Result<bool, MediaError> {
        Self::toggle(self.media.as_ref(), &mut self.microphone, MediaKind::Microphone).await
    }

    /// Returns whether audio is now muted.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Stops all media and unmounts the conversation.
    pub async fn end_call(&mut self) {
        if let Some(handle) = self.camera.take() {
            self.media.stop(handle).await;
        }
        if let Some(handle) = self.microphone.take() {
            self.media.stop(handle).await;
        }
        if let Some(orchestrator) = &self.orchestrator {
            orchestrator.teardown().await;
        }
        self.status = CallStatus::Ended;
        tracing::info!("video call ended");
    }

    fn active(&self) -> Result<&ConversationOrchestrator> {
        match (&self.status, &self.orchestrator) {
            (CallStatus::Active, Some(orchestrator)) => Ok(orchestrator),
            _ => Err(MindEaseError::invalid_input("no active call")),
        }
    }

    async fn toggle(
        media: &dyn MediaDevice,
        slot: &mut Option<MediaHandle>,
        kind: MediaKind,
    ) -> std::result::Result<bool, MediaError> {
        match slot.take() {
            Some(handle) => {
                media.stop(handle).await;
                Ok(false)
            }
            None => match media.start(kind).await {
                Ok(handle) => {
                    *slot = Some(handle);
                    Ok(true)
                }
                Err(e) => {
                    tracing::warn!(?kind, error = %e, "could not start media");
                    Err(e)
                }
            },
        }
    }
}
