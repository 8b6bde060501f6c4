//! ConversationOrchestrator - per-surface turn-taking controller.
//!
//! One orchestrator owns one `TurnLog` for as long as its surface is mounted.
//! `submit` appends the user turn, waits for exactly one completion, appends
//! the reply (or the language fallback), then consults the analysis trigger.
//!
//! # State machine
//!
//! ```text
//! Idle --submit--> AwaitingReply --reply/fallback--> Idle
//! ```
//!
//! A submit while `AwaitingReply` is a no-op. After [`teardown`] every late
//! response is dropped without touching the log, the mood history or the
//! analysis store.
//!
//! [`teardown`]: ConversationOrchestrator::teardown

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use mindease_core::analysis::{
    AnalysisExtractor, AnalysisRecord, AnalysisRepository, ExtractionError, StoredAnalysis,
};
use mindease_core::completion::{CompletionClient, CompletionError, CompletionRequest};
use mindease_core::conversation::{Turn, TurnLog};
use mindease_core::error::Result;
use mindease_core::language::Language;
use mindease_core::mood::MoodHistory;
use mindease_core::MindEaseError;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::analysis_trigger::AnalysisTrigger;
use crate::emotion::EmotionClassifier;
use crate::profile::SurfaceProfile;

/// Optional bound on transcript length, from `[session] max_turns`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_turns: Option<usize>,
}

impl SessionLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_max_turns(max_turns: usize) -> Self {
        Self {
            max_turns: Some(max_turns),
        }
    }

    /// A submit adds two turns; refuse it if they would not fit.
    fn admits(&self, current_len: usize) -> bool {
        self.max_turns.is_none_or(|max| current_len + 2 <= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Blank after trimming.
    Empty,
    /// A reply is already pending.
    Busy,
    /// The surface has been unmounted.
    TornDown,
    /// `max_turns` would be exceeded.
    SessionFull,
}

/// Why an analysis attempt produced nothing.
#[derive(Debug)]
pub enum AnalysisFailure {
    Completion(CompletionError),
    Extraction(ExtractionError),
    Storage(MindEaseError),
    Prompt(MindEaseError),
}

impl std::fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisFailure::Completion(e) => write!(f, "analysis request failed: {}", e),
            AnalysisFailure::Extraction(e) => write!(f, "analysis reply unusable: {}", e),
            AnalysisFailure::Storage(e) => write!(f, "analysis not stored: {}", e),
            AnalysisFailure::Prompt(e) => write!(f, "analysis prompt failed: {}", e),
        }
    }
}

#[derive(Debug)]
pub enum AnalysisOutcome {
    /// Policy disabled or transcript below threshold.
    NotTriggered,
    /// Another analysis is still running for this surface.
    InProgress,
    Stored(StoredAnalysis),
    /// `alert` mirrors the profile flag: the surface should tell the user.
    Failed { failure: AnalysisFailure, alert: bool },
    /// The orchestrator was torn down before the reply arrived.
    Discarded,
}

impl AnalysisOutcome {
    pub fn stored(&self) -> Option<&StoredAnalysis> {
        match self {
            AnalysisOutcome::Stored(stored) => Some(stored),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Rejected(RejectReason),
    Replied {
        reply: String,
        analysis: AnalysisOutcome,
    },
    /// The backend failed; the fallback text was appended instead.
    Fallback { reply: String, error: CompletionError },
    /// The reply arrived after teardown and was dropped.
    Discarded,
}

impl SubmitOutcome {
    /// Text appended as the assistant turn, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Replied { reply, .. } | SubmitOutcome::Fallback { reply, .. } => {
                Some(reply)
            }
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmitOutcome::Rejected(_))
    }
}

struct SessionState {
    log: TurnLog,
    phase: Phase,
    analyzing: bool,
}

/// State shared with detached side requests.
struct Shared {
    state: Mutex<SessionState>,
    moods: Mutex<MoodHistory>,
    side_requests: Mutex<JoinSet<()>>,
    torn_down: AtomicBool,
}

impl Shared {
    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

pub struct ConversationOrchestrator {
    profile: SurfaceProfile,
    client: Arc<dyn CompletionClient>,
    repository: Arc<dyn AnalysisRepository>,
    trigger: AnalysisTrigger,
    extractor: AnalysisExtractor,
    classifier: Option<EmotionClassifier>,
    limits: SessionLimits,
    shared: Arc<Shared>,
}

impl ConversationOrchestrator {
    /// Mounts a surface: the log is seeded with the profile's greeting.
    pub fn new(
        profile: SurfaceProfile,
        client: Arc<dyn CompletionClient>,
        repository: Arc<dyn AnalysisRepository>,
    ) -> Result<Self> {
        let greeting = Turn::assistant(profile.greeting())?;
        let classifier = profile.emotion_tracking().then(EmotionClassifier::new);

        tracing::info!(surface = %profile.surface(), language = %profile.language(), "surface mounted");

        Ok(Self {
            trigger: AnalysisTrigger::new(profile.policy()),
            profile,
            client,
            repository,
            extractor: AnalysisExtractor::new(),
            classifier,
            limits: SessionLimits::unbounded(),
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState {
                    log: TurnLog::seeded(greeting),
                    phase: Phase::Idle,
                    analyzing: false,
                }),
                moods: Mutex::new(MoodHistory::default()),
                side_requests: Mutex::new(JoinSet::new()),
                torn_down: AtomicBool::new(false),
            }),
        })
    }

    pub fn with_limits(mut self, limits: SessionLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn profile(&self) -> &SurfaceProfile {
        &self.profile
    }

    pub fn language(&self) -> Language {
        self.profile.language()
    }

    pub fn trigger(&self) -> &AnalysisTrigger {
        &self.trigger
    }

    pub async fn phase(&self) -> Phase {
        self.shared.state.lock().await.phase
    }

    pub async fn snapshot(&self) -> Vec<Turn> {
        self.shared.state.lock().await.log.snapshot()
    }

    pub async fn turn_count(&self) -> usize {
        self.shared.state.lock().await.log.len()
    }

    pub async fn mood_history(&self) -> MoodHistory {
        self.shared.moods.lock().await.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.is_torn_down()
    }

    /// Submits one user message and waits for the reply.
    ///
    /// Returns `Err` only when a reply turn cannot be built (a blank reply
    /// with a blank fallback); the orchestrator is back in `Idle` either way.
    pub async fn submit(&self, text: &str) -> Result<SubmitOutcome> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(SubmitOutcome::Rejected(RejectReason::Empty));
        }

        let request = {
            let mut state = self.shared.state.lock().await;
            if self.shared.is_torn_down() {
                return Ok(SubmitOutcome::Rejected(RejectReason::TornDown));
            }
            if state.phase == Phase::AwaitingReply {
                tracing::debug!(surface = %self.profile.surface(), "submit ignored, reply pending");
                return Ok(SubmitOutcome::Rejected(RejectReason::Busy));
            }
            if !self.limits.admits(state.log.len()) {
                tracing::warn!(surface = %self.profile.surface(), len = state.log.len(), "session turn limit reached");
                return Ok(SubmitOutcome::Rejected(RejectReason::SessionFull));
            }

            state.log.append(Turn::user(trimmed)?);
            let request = self.reply_request(state.log.snapshot())?;
            state.phase = Phase::AwaitingReply;
            request
        };

        if self.classifier.is_some() {
            self.spawn_emotion_request(trimmed.to_string()).await;
        }

        let result = self.client.complete(&request).await;

        let (reply_turn, error) = match result {
            Ok(reply) => (Turn::assistant(reply), None),
            Err(err) => {
                tracing::warn!(surface = %self.profile.surface(), error = %err, "completion failed, using fallback");
                let fallback = if err.fallback().trim().is_empty() {
                    self.profile.fallback_text()
                } else {
                    err.fallback()
                };
                (Turn::assistant(fallback), Some(err))
            }
        };

        let (reply, claimed) = {
            let mut state = self.shared.state.lock().await;
            if self.shared.is_torn_down() {
                tracing::debug!(surface = %self.profile.surface(), "late reply discarded after teardown");
                return Ok(SubmitOutcome::Discarded);
            }
            state.phase = Phase::Idle;
            let turn = reply_turn?;
            let reply = turn.text().to_string();
            state.log.append(turn);

            if let Some(error) = error {
                return Ok(SubmitOutcome::Fallback { reply, error });
            }

            // Snapshot in the same critical section so the analysis covers
            // exactly the transcript ending with this reply.
            let claimed = if self.trigger.is_automatic()
                && self.trigger.should_analyze(state.log.len())
            {
                Some(self.claim_analysis(&mut state))
            } else {
                None
            };
            (reply, claimed)
        };

        let analysis = match claimed {
            None => AnalysisOutcome::NotTriggered,
            Some(Err(outcome)) => outcome,
            Some(Ok((key, snapshot))) => self.run_analysis(key, snapshot).await,
        };

        Ok(SubmitOutcome::Replied { reply, analysis })
    }

    /// Operator-invoked analysis; subject to the same length threshold.
    pub async fn analyze(&self) -> AnalysisOutcome {
        let claimed = {
            let mut state = self.shared.state.lock().await;
            if self.shared.is_torn_down() {
                return AnalysisOutcome::Discarded;
            }
            if !self.trigger.should_analyze(state.log.len()) {
                return AnalysisOutcome::NotTriggered;
            }
            self.claim_analysis(&mut state)
        };
        match claimed {
            Ok((key, snapshot)) => self.run_analysis(key, snapshot).await,
            Err(outcome) => outcome,
        }
    }

    /// Waits for every detached emotion request issued so far.
    pub async fn settle_side_requests(&self) {
        let mut requests = std::mem::take(&mut *self.shared.side_requests.lock().await);
        while let Some(joined) = requests.join_next().await {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "emotion request task failed");
            }
        }
    }

    /// Unmounts the surface. The in-flight reply is left to finish and is
    /// dropped; pending emotion requests are aborted.
    pub async fn teardown(&self) {
        {
            let _state = self.shared.state.lock().await;
            let _moods = self.shared.moods.lock().await;
            self.shared.torn_down.store(true, Ordering::SeqCst);
        }
        let mut requests = std::mem::take(&mut *self.shared.side_requests.lock().await);
        requests.shutdown().await;
        tracing::info!(surface = %self.profile.surface(), "surface torn down");
    }

    #[cfg(test)]
    async fn side_request_count(&self) -> usize {
        self.shared.side_requests.lock().await.len()
    }

    fn reply_request(&self, transcript: Vec<Turn>) -> Result<CompletionRequest> {
        Ok(CompletionRequest::new(transcript)?
            .with_language(self.profile.language())
            .with_system_instruction(self.profile.system_instruction())
            .with_generation(self.profile.generation().clone())
            .with_safety_filters(self.profile.safety_filters()))
    }

    async fn spawn_emotion_request(&self, message: String) {
        let Some(classifier) = self.classifier.clone() else {
            return;
        };
        let client = Arc::clone(&self.client);
        let shared = Arc::clone(&self.shared);
        let language = self.profile.language();

        let mut requests = self.shared.side_requests.lock().await;
        while let Some(joined) = requests.try_join_next() {
            if let Err(e) = joined {
                tracing::warn!(error = %e, "emotion request task failed");
            }
        }
        requests.spawn(async move {
            match classifier.classify(client.as_ref(), &message, language).await {
                Ok(sample) => {
                    let mut moods = shared.moods.lock().await;
                    if shared.is_torn_down() {
                        return;
                    }
                    tracing::debug!(label = %sample.label(), intensity = sample.intensity(), "mood recorded");
                    moods.record(sample);
                }
                Err(e) => tracing::warn!(error = %e, "emotion classification failed"),
            }
        });
    }

    /// Marks an analysis as running and captures the transcript it covers.
    /// Callers hold the state lock and have checked teardown.
    fn claim_analysis(
        &self,
        state: &mut SessionState,
    ) -> std::result::Result<(&'static str, Vec<Turn>), AnalysisOutcome> {
        let Some(key) = self.profile.analysis_key() else {
            return Err(AnalysisOutcome::NotTriggered);
        };
        if state.analyzing {
            return Err(AnalysisOutcome::InProgress);
        }
        state.analyzing = true;
        Ok((key, state.log.snapshot()))
    }

    async fn run_analysis(&self, key: &'static str, snapshot: Vec<Turn>) -> AnalysisOutcome {
        let message_count = snapshot.len();
        let issued_at = Utc::now();
        let result = self.request_analysis(&snapshot).await;
        let outcome = self.store_analysis(key, result, issued_at, message_count).await;
        self.shared.state.lock().await.analyzing = false;
        outcome
    }

    async fn store_analysis(
        &self,
        key: &'static str,
        result: std::result::Result<AnalysisRecord, AnalysisFailure>,
        issued_at: DateTime<Utc>,
        message_count: usize,
    ) -> AnalysisOutcome {
        if self.shared.is_torn_down() {
            return AnalysisOutcome::Discarded;
        }

        let record = match result {
            Ok(record) => record,
            Err(failure) => {
                tracing::warn!(surface = %self.profile.surface(), %failure, "analysis discarded");
                return AnalysisOutcome::Failed {
                    failure,
                    alert: self.profile.alert_on_analysis_failure(),
                };
            }
        };

        let stored = StoredAnalysis::new(record, issued_at, message_count);
        if let Err(e) = self.repository.save(key, &stored).await {
            tracing::warn!(key, error = %e, "failed to store analysis");
            return AnalysisOutcome::Failed {
                failure: AnalysisFailure::Storage(e),
                alert: self.profile.alert_on_analysis_failure(),
            };
        }
        if self.shared.is_torn_down() {
            tracing::debug!(key, "surface torn down while analysis was stored");
            return AnalysisOutcome::Discarded;
        }

        tracing::info!(key, message_count, mood = stored.analysis().mood(), "analysis stored");
        AnalysisOutcome::Stored(stored)
    }

    async fn request_analysis(
        &self,
        snapshot: &[Turn],
    ) -> std::result::Result<AnalysisRecord, AnalysisFailure> {
        let prompt = self
            .trigger
            .build_analysis_prompt(snapshot)
            .map_err(AnalysisFailure::Prompt)?;

        let request = CompletionRequest::new(vec![prompt])
            .map_err(AnalysisFailure::Prompt)?
            .with_language(self.profile.language())
            .with_generation(self.profile.generation().clone());

        let raw = self
            .client
            .complete(&request)
            .await
            .map_err(AnalysisFailure::Completion)?;

        self.extractor
            .extract(&raw)
            .map_err(AnalysisFailure::Extraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis_trigger::AnalysisPolicy;
    use crate::test_support::{ScriptedClient, is_analysis_request, is_emotion_request};
    use mindease_core::analysis::{CHAT_ANALYSIS_KEY as CHAT_KEY, VIDEO_ANALYSIS_KEY};
    use mindease_core::conversation::TurnRole;
    use mindease_core::mood::MoodLabel;
    use mindease_infrastructure::InMemoryAnalysisRepository;
    use std::time::Duration;

    const ANALYSIS_JSON: &str = r#"{"mood":"anxious","problemSolved":false,"insights":["i1","i2","i3"],"recommendations":["r1","r2"]}"#;

    fn orchestrator(
        profile: SurfaceProfile,
        client: Arc<ScriptedClient>,
    ) -> (ConversationOrchestrator, Arc<InMemoryAnalysisRepository>) {
        let repository = Arc::new(InMemoryAnalysisRepository::new());
        let orchestrator =
            ConversationOrchestrator::new(profile, client, repository.clone()).unwrap();
        (orchestrator, repository)
    }

    /// Repository whose `save` waits for [`StallingRepository::release`].
    #[derive(Default)]
    struct StallingRepository {
        inner: InMemoryAnalysisRepository,
        entered: tokio::sync::Notify,
        gate: tokio::sync::Notify,
    }

    impl StallingRepository {
        fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait::async_trait]
    impl AnalysisRepository for StallingRepository {
        async fn save(&self, key: &str, record: &StoredAnalysis) -> Result<()> {
            self.entered.notify_one();
            self.gate.notified().await;
            self.inner.save(key, record).await
        }

        async fn load(&self, key: &str) -> Result<Option<StoredAnalysis>> {
            self.inner.load(key).await
        }
    }

    #[tokio::test]
    async fn mounts_with_greeting() {
        let client = Arc::new(ScriptedClient::replying("hi"));
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client);

        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].role(), TurnRole::Assistant);
        assert_eq!(orch.phase().await, Phase::Idle);
    }

    #[tokio::test]
    async fn blank_submit_is_a_no_op() {
        let client = Arc::new(ScriptedClient::replying("hi"));
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client.clone());

        let outcome = orch.submit("   \n").await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected(RejectReason::Empty)));
        assert_eq!(orch.turn_count().await, 1);
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn user_text_is_trimmed_and_reply_appended() {
        let client = Arc::new(ScriptedClient::replying("I'm here for you."));
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client.clone());

        let outcome = orch.submit("  I feel low  ").await.unwrap();

        assert_eq!(outcome.reply(), Some("I'm here for you."));
        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot[1].text(), "I feel low");
        assert_eq!(snapshot[2].text(), "I'm here for you.");

        let request = &client.requests()[0];
        assert_eq!(request.transcript().len(), 2);
        assert!(request.safety_filters());
        assert!(request.system_instruction().unwrap().contains("MindfulChat"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn submit_while_awaiting_reply_is_ignored() {
        let client = Arc::new(ScriptedClient::replying("first reply").gated());
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client.clone());
        let orch = Arc::new(orch);

        let pending = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.submit("first").await })
        };
        client.wait_entered().await;

        assert_eq!(orch.phase().await, Phase::AwaitingReply);
        let second = orch.submit("second").await.unwrap();
        assert!(matches!(second, SubmitOutcome::Rejected(RejectReason::Busy)));
        assert_eq!(orch.turn_count().await, 2);
        assert_eq!(client.calls(), 1);

        client.release();
        let first = pending.await.unwrap().unwrap();
        assert_eq!(first.reply(), Some("first reply"));
        assert_eq!(orch.turn_count().await, 3);
        assert_eq!(orch.phase().await, Phase::Idle);
    }

    #[tokio::test]
    async fn failure_appends_language_fallback() {
        let hindi_fallback = "मुझे कनेक्ट करने में परेशानी हो रही है। क्या आप फिर से कोशिश कर सकते हैं?";
        let client = Arc::new(ScriptedClient::failing(hindi_fallback));
        let (orch, _) = orchestrator(SurfaceProfile::audio(Language::Hindi), client);

        let outcome = orch.submit("नमस्ते").await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Fallback { .. }));
        let snapshot = orch.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[2].role(), TurnRole::Assistant);
        assert_eq!(snapshot[2].text(), hindi_fallback);
        assert_eq!(orch.phase().await, Phase::Idle);
    }

    #[tokio::test]
    async fn blank_error_fallback_uses_profile_text() {
        let client = Arc::new(ScriptedClient::failing(""));
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client);

        let outcome = orch.submit("hello").await.unwrap();
        assert_eq!(
            outcome.reply(),
            Some("I'm sorry, I'm having trouble connecting right now. Please try again in a moment.")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn late_reply_after_teardown_is_discarded() {
        let client = Arc::new(ScriptedClient::replying("too late").gated());
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client.clone());
        let orch = Arc::new(orch);

        let pending = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.submit("hello").await })
        };
        client.wait_entered().await;
        orch.teardown().await;
        client.release();

        let outcome = pending.await.unwrap().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Discarded));
        assert_eq!(orch.turn_count().await, 2);

        let after = orch.submit("again").await.unwrap();
        assert!(matches!(after, SubmitOutcome::Rejected(RejectReason::TornDown)));
    }

    #[tokio::test]
    async fn max_turns_rejects_further_submits() {
        let client = Arc::new(ScriptedClient::replying("ok"));
        let (orch, _) = orchestrator(SurfaceProfile::audio(Language::English), client.clone());
        let orch = orch.with_limits(SessionLimits::with_max_turns(3));

        assert!(!orch.submit("one").await.unwrap().is_rejected());
        let outcome = orch.submit("two").await.unwrap();

        assert!(matches!(outcome, SubmitOutcome::Rejected(RejectReason::SessionFull)));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn chat_analyses_automatically_once_threshold_reached() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_analysis_request(request) {
                Ok(format!("Here you go:\n```json\n{}\n```", ANALYSIS_JSON))
            } else {
                Ok("reply".to_string())
            }
        }));
        let (orch, repository) = orchestrator(SurfaceProfile::chat(), client.clone());

        let first = orch.submit("one").await.unwrap();
        assert!(matches!(
            first,
            SubmitOutcome::Replied { analysis: AnalysisOutcome::NotTriggered, .. }
        ));

        let second = orch.submit("two").await.unwrap();
        let SubmitOutcome::Replied { analysis, .. } = second else {
            panic!("expected a reply");
        };
        let stored = analysis.stored().expect("analysis stored");
        assert_eq!(stored.message_count(), 5);

        let loaded = repository.load(CHAT_KEY).await.unwrap().unwrap();
        assert_eq!(&loaded, stored);

        let analysis_request = client.requests().into_iter().find(is_analysis_request).unwrap();
        assert_eq!(analysis_request.transcript().len(), 1);
    }

    #[tokio::test]
    async fn extraction_failure_is_discarded_silently_on_chat() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_analysis_request(request) {
                Ok("I'd rather not answer in JSON.".to_string())
            } else {
                Ok("reply".to_string())
            }
        }));
        let profile = SurfaceProfile::chat().with_policy(AnalysisPolicy::Automatic { min_turns: 3 });
        let (orch, repository) = orchestrator(profile, client);

        let outcome = orch.submit("hello").await.unwrap();
        let SubmitOutcome::Replied { analysis, .. } = outcome else {
            panic!("expected a reply");
        };
        assert!(matches!(
            analysis,
            AnalysisOutcome::Failed {
                failure: AnalysisFailure::Extraction(ExtractionError::NoJsonFound),
                alert: false
            }
        ));
        assert!(repository.load(CHAT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn video_analysis_is_manual_and_alerts_on_failure() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_emotion_request(request) {
                Ok(r#"{"mood":"sad","intensity":6}"#.to_string())
            } else if is_analysis_request(request) {
                Ok(r#"{"mood":"calm"}"#.to_string())
            } else {
                Ok("I hear you.".to_string())
            }
        }));
        let (orch, repository) = orchestrator(SurfaceProfile::video(), client);

        assert!(matches!(orch.analyze().await, AnalysisOutcome::NotTriggered));

        let outcome = orch.submit("I lost my job").await.unwrap();
        assert!(matches!(
            outcome,
            SubmitOutcome::Replied { analysis: AnalysisOutcome::NotTriggered, .. }
        ));

        let analysis = orch.analyze().await;
        match analysis {
            AnalysisOutcome::Failed {
                failure: AnalysisFailure::Extraction(err),
                alert,
            } => {
                assert!(alert);
                assert_eq!(err.key(), Some("problemSolved"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(repository.load(VIDEO_ANALYSIS_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn emotion_side_request_updates_mood_history() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_emotion_request(request) {
                Ok(r#"{"mood":"anxious","intensity":8}"#.to_string())
            } else {
                Ok("Let's breathe together.".to_string())
            }
        }));
        let (orch, _) = orchestrator(SurfaceProfile::video(), client.clone());

        orch.submit("My heart is racing").await.unwrap();
        orch.settle_side_requests().await;

        let moods = orch.mood_history().await;
        assert_eq!(moods.len(), 1);
        assert_eq!(moods.latest().unwrap().label(), MoodLabel::Anxious);
        assert_eq!(moods.latest().unwrap().intensity(), 8);
        assert_eq!(client.calls(), 2);
        assert_eq!(orch.turn_count().await, 3);
    }

    #[tokio::test]
    async fn emotion_failure_never_blocks_reply() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_emotion_request(request) {
                Ok("not sure".to_string())
            } else {
                Ok("Tell me more.".to_string())
            }
        }));
        let (orch, _) = orchestrator(SurfaceProfile::video(), client);

        let outcome = orch.submit("meh").await.unwrap();
        orch.settle_side_requests().await;

        assert_eq!(outcome.reply(), Some("Tell me more."));
        assert!(orch.mood_history().await.is_empty());
    }

    #[tokio::test]
    async fn chat_surface_skips_emotion_requests() {
        let client = Arc::new(ScriptedClient::replying("ok"));
        let (orch, _) = orchestrator(SurfaceProfile::chat(), client.clone());

        orch.submit("hello").await.unwrap();
        orch.settle_side_requests().await;

        assert_eq!(client.calls(), 1);
        assert!(!client.requests().iter().any(is_emotion_request));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn state_stays_available_while_analysis_is_saved() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_analysis_request(request) {
                Ok(ANALYSIS_JSON.to_string())
            } else {
                Ok("reply".to_string())
            }
        }));
        let repository = Arc::new(StallingRepository::default());
        let profile = SurfaceProfile::chat().with_policy(AnalysisPolicy::Automatic { min_turns: 3 });
        let orch = Arc::new(
            ConversationOrchestrator::new(profile, client, repository.clone()).unwrap(),
        );

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.submit("first").await })
        };
        repository.entered.notified().await;

        let snapshot = tokio::time::timeout(Duration::from_secs(1), orch.snapshot())
            .await
            .expect("state lock released during save");
        assert_eq!(snapshot.len(), 3);

        let second = orch.submit("second").await.unwrap();
        assert!(matches!(
            second,
            SubmitOutcome::Replied { analysis: AnalysisOutcome::InProgress, .. }
        ));

        repository.release();
        let first = first.await.unwrap().unwrap();
        let SubmitOutcome::Replied { analysis, .. } = first else {
            panic!("expected a reply");
        };
        assert_eq!(analysis.stored().unwrap().message_count(), 3);
        assert_eq!(orch.turn_count().await, 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn analysis_covers_transcript_ending_with_triggering_reply() {
        let client = Arc::new(
            ScriptedClient::new(|request| {
                if is_analysis_request(request) {
                    Ok(ANALYSIS_JSON.to_string())
                } else {
                    Ok("reply".to_string())
                }
            })
            .gated_on(is_analysis_request),
        );
        let profile = SurfaceProfile::chat().with_policy(AnalysisPolicy::Automatic { min_turns: 3 });
        let (orch, repository) = orchestrator(profile, client.clone());
        let orch = Arc::new(orch);

        let first = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.submit("first message").await })
        };
        client.wait_entered().await;
        orch.submit("second message").await.unwrap();
        client.release();
        first.await.unwrap().unwrap();

        let stored = repository.load(CHAT_KEY).await.unwrap().unwrap();
        assert_eq!(stored.message_count(), 3);
        let analysis_request = client.requests().into_iter().find(is_analysis_request).unwrap();
        let prompt = analysis_request.transcript()[0].text().to_string();
        assert!(prompt.contains("first message"));
        assert!(!prompt.contains("second message"));
    }

    #[tokio::test]
    async fn finished_emotion_requests_are_reaped() {
        let client = Arc::new(ScriptedClient::new(|request| {
            if is_emotion_request(request) {
                Ok(r#"{"mood":"calm","intensity":3}"#.to_string())
            } else {
                Ok("Go on.".to_string())
            }
        }));
        let (orch, _) = orchestrator(SurfaceProfile::video(), client);

        for i in 0..30 {
            orch.submit(&format!("message {}", i)).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        orch.submit("one more").await.unwrap();

        assert_eq!(orch.side_request_count().await, 1);

        orch.teardown().await;
        assert_eq!(orch.side_request_count().await, 0);
    }
}
