//! Scripted collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use mindease_core::completion::{
    CompletionClient, CompletionError, CompletionErrorKind, CompletionRequest,
};
use mindease_core::language::Language;
use mindease_core::media::{MediaDevice, MediaError, MediaHandle, MediaKind};
use mindease_core::speech::{SpeechError, SpeechEvent, SpeechInput, SpeechOutput, SpeechStream};
use tokio::sync::Notify;

type Responder = dyn Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync;

/// Completion client answering from a closure, optionally holding each call
/// until [`ScriptedClient::release`].
pub struct ScriptedClient {
    responder: Box<Responder>,
    calls: AtomicUsize,
    requests: StdMutex<Vec<CompletionRequest>>,
    gate: Option<Arc<Notify>>,
    gate_filter: Option<fn(&CompletionRequest) -> bool>,
    entered: Arc<Notify>,
}

impl ScriptedClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            requests: StdMutex::new(Vec::new()),
            gate: None,
            gate_filter: None,
            entered: Arc::new(Notify::new()),
        }
    }

    pub fn replying(text: &'static str) -> Self {
        Self::new(move |_| Ok(text.to_string()))
    }

    pub fn failing(fallback: &'static str) -> Self {
        Self::new(move |_| {
            Err(CompletionError::new(
                CompletionErrorKind::Transport,
                "connection refused",
                fallback,
            ))
        })
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    /// Holds only the calls matching `filter`.
    pub fn gated_on(mut self, filter: fn(&CompletionRequest) -> bool) -> Self {
        self.gate_filter = Some(filter);
        self.gated()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Resolves once a call has reached the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

pub fn is_emotion_request(request: &CompletionRequest) -> bool {
    request.transcript()[0]
        .text()
        .starts_with("Classify the emotional state")
}

pub fn is_analysis_request(request: &CompletionRequest) -> bool {
    request.transcript()[0]
        .text()
        .starts_with("Based on our conversation so far")
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let held = self.gate_filter.is_none_or(|filter| filter(request));
        if let (Some(gate), true) = (&self.gate, held) {
            self.entered.notify_one();
            gate.notified().await;
        }
        (self.responder)(request)
    }
}

/// Speech input replaying one scripted event list per recognition session.
/// Once the script runs out every session fails with a recognition error.
#[derive(Default)]
pub struct ScriptedSpeechInput {
    sessions: StdMutex<VecDeque<Vec<Result<SpeechEvent, SpeechError>>>>,
    languages: StdMutex<Vec<Language>>,
    stops: AtomicUsize,
}

impl ScriptedSpeechInput {
    pub fn new(sessions: Vec<Vec<Result<SpeechEvent, SpeechError>>>) -> Self {
        Self {
            sessions: StdMutex::new(sessions.into()),
            ..Self::default()
        }
    }

    pub fn languages(&self) -> Vec<Language> {
        self.languages.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechInput for ScriptedSpeechInput {
    async fn start_listening(&self, language: Language) -> Result<SpeechStream, SpeechError> {
        self.languages.lock().unwrap().push(language);
        let events = self
            .sessions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| vec![Err(SpeechError::Recognition("no-speech".into()))]);
        Ok(futures::stream::iter(events).boxed())
    }

    async fn stop_listening(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Speech output recording what it was asked to say.
#[derive(Default)]
pub struct RecordingSpeechOutput {
    spoken: StdMutex<Vec<(String, Language)>>,
    cancels: AtomicUsize,
    fail: bool,
}

impl RecordingSpeechOutput {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn spoken(&self) -> Vec<(String, Language)> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechOutput for RecordingSpeechOutput {
    async fn speak(&self, text: &str, language: Language) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push((text.to_string(), language));
        if self.fail {
            return Err(SpeechError::Synthesis("audio device busy".into()));
        }
        Ok(())
    }

    async fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

/// Media device that can refuse the camera and tracks live handles.
#[derive(Default)]
pub struct FakeMedia {
    deny_camera: bool,
    live: StdMutex<Vec<MediaHandle>>,
    next_id: AtomicUsize,
}

impl FakeMedia {
    pub fn denying_camera() -> Self {
        Self {
            deny_camera: true,
            ..Self::default()
        }
    }

    pub fn live(&self) -> Vec<MediaHandle> {
        self.live.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaDevice for FakeMedia {
    async fn start(&self, kind: MediaKind) -> Result<MediaHandle, MediaError> {
        if self.deny_camera && kind == MediaKind::Camera {
            return Err(MediaError::PermissionDenied(kind));
        }
        let handle = MediaHandle {
            id: format!("track-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            kind,
        };
        self.live.lock().unwrap().push(handle.clone());
        Ok(handle)
    }

    async fn stop(&self, handle: MediaHandle) {
        self.live.lock().unwrap().retain(|h| h != &handle);
    }
}
