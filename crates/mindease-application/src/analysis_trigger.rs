//! When to analyse a conversation, and the analysis prompt turn.

use mindease_core::conversation::Turn;
use mindease_core::error::Result;

use crate::prompts;

/// Turn count at which the chat surface starts analysing automatically.
pub const CHAT_MIN_TURNS: usize = 5;

/// Turn count the video surface requires before a manual analysis.
pub const VIDEO_MIN_TURNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisPolicy {
    /// The surface never analyses.
    Disabled,
    /// Re-evaluated after every successful assistant reply.
    Automatic { min_turns: usize },
    /// Only when the operator asks.
    Manual { min_turns: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisTrigger {
    policy: AnalysisPolicy,
}

impl AnalysisTrigger {
    pub fn new(policy: AnalysisPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AnalysisPolicy {
        self.policy
    }

    pub fn is_automatic(&self) -> bool {
        matches!(self.policy, AnalysisPolicy::Automatic { .. })
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.policy, AnalysisPolicy::Manual { .. })
    }

    /// Whether a transcript of `turn_count` turns is long enough to analyse.
    pub fn should_analyze(&self, turn_count: usize) -> bool {
        match self.policy {
            AnalysisPolicy::Disabled => false,
            AnalysisPolicy::Automatic { min_turns } | AnalysisPolicy::Manual { min_turns } => {
                turn_count >= min_turns
            }
        }
    }

    /// One synthetic user turn asking for the JSON analysis, with the prior
    /// transcript embedded as context.
    pub fn build_analysis_prompt(&self, transcript: &[Turn]) -> Result<Turn> {
        Turn::user(prompts::analysis_prompt(transcript)?)
    }
}
