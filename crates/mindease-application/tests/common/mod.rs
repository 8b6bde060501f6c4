#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use mindease_core::completion::{
    CompletionClient, CompletionError, CompletionErrorKind, CompletionRequest,
};
use mindease_core::language::Language;
use mindease_core::media::{MediaDevice, MediaError, MediaHandle, MediaKind};
use mindease_core::speech::{SpeechError, SpeechEvent, SpeechInput, SpeechOutput, SpeechStream};

pub const ANALYSIS_JSON: &str = r#"{"mood":"anxious but hopeful","problemSolved":false,"insights":["Work stress","Poor sleep","Wants routine"],"recommendations":["Wind-down routine","Short walks"]}"#;

/// Answers conversation requests with a numbered reply and analysis
/// requests with a fenced JSON block.
#[derive(Default)]
pub struct StubClient {
    calls: AtomicUsize,
    fail_with: Option<String>,
}

impl StubClient {
    pub fn failing(fallback: &str) -> Self {
        Self {
            fail_with: Some(fallback.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for StubClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(fallback) = &self.fail_with {
            return Err(CompletionError::new(
                CompletionErrorKind::Status(500),
                "internal error",
                fallback.clone(),
            ));
        }
        let first = request.transcript()[0].text();
        if first.starts_with("Based on our conversation so far") {
            return Ok(format!("Sure.\n```json\n{}\n```", ANALYSIS_JSON));
        }
        if first.starts_with("Classify the emotional state") {
            return Ok(r#"{"mood":"neutral","intensity":5}"#.to_string());
        }
        Ok(format!("reply {}", n))
    }
}

pub struct StubSpeechIn {
    sessions: Mutex<VecDeque<Vec<Result<SpeechEvent, SpeechError>>>>,
}

impl StubSpeechIn {
    pub fn new(sessions: Vec<Vec<Result<SpeechEvent, SpeechError>>>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
        }
    }
}

#[async_trait]
impl SpeechInput for StubSpeechIn {
    async fn start_listening(&self, _language: Language) -> Result<SpeechStream, SpeechError> {
        match self.sessions.lock().unwrap().pop_front() {
            Some(events) => Ok(futures::stream::iter(events).boxed()),
            None => Err(SpeechError::NotSupported),
        }
    }

    async fn stop_listening(&self) {}
}

#[derive(Default)]
pub struct StubSpeechOut {
    pub spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechOutput for StubSpeechOut {
    async fn speak(&self, text: &str, _language: Language) -> Result<(), SpeechError> {
        self.spoken.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn cancel(&self) {}
}

#[derive(Default)]
pub struct StubMedia {
    pub live: Mutex<Vec<MediaHandle>>,
}

#[async_trait]
impl MediaDevice for StubMedia {
    async fn start(&self, kind: MediaKind) -> Result<MediaHandle, MediaError> {
        let handle = MediaHandle {
            id: format!("{:?}", kind),
            kind,
        };
        self.live.lock().unwrap().push(handle.clone());
        Ok(handle)
    }

    async fn stop(&self, handle: MediaHandle) {
        self.live.lock().unwrap().retain(|h| h != &handle);
    }
}
