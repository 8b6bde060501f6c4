pub mod analysis_trigger;
pub mod audio_session;
pub mod bootstrap;
pub mod emotion;
pub mod orchestrator;
pub mod profile;
pub mod prompts;
pub mod report;
pub mod video_session;

pub use analysis_trigger::{AnalysisPolicy, AnalysisTrigger};
pub use audio_session::{AudioSession, HandsFreeStop, ListenOutcome};
pub use bootstrap::AppContext;
pub use orchestrator::{
    AnalysisFailure, AnalysisOutcome, ConversationOrchestrator, Phase, RejectReason, SessionLimits,
    SubmitOutcome,
};
pub use profile::SurfaceProfile;
pub use report::{AnalysisReport, ReportSection};
pub use video_session::{CallStatus, MediaState, VideoSession};

#[cfg(test)]
mod test_support;
