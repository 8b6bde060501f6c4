//! Read-only view of the stored analysis for a surface.

use chrono::Local;
use mindease_core::Surface;
use mindease_core::analysis::{AnalysisRepository, StoredAnalysis};
use mindease_core::error::Result;

const SOLVED_TEXT: &str =
    "Based on your conversation, it appears that your main concerns have been adequately addressed.";
const UNSOLVED_TEXT: &str =
    "Your conversation suggests that some of your concerns may require additional attention or support.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub title: String,
    pub lines: Vec<String>,
}

impl ReportSection {
    fn new(title: impl Into<String>, lines: Vec<String>) -> Self {
        Self {
            title: title.into(),
            lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisReport {
    NoAnalysisYet(Surface),
    Available(StoredAnalysis),
}

impl AnalysisReport {
    /// Loads the report for `surface`. Surfaces without analysis always
    /// render the empty state.
    pub async fn load(repository: &dyn AnalysisRepository, surface: Surface) -> Result<Self> {
        let Some(key) = surface.analysis_key() else {
            return Ok(Self::NoAnalysisYet(surface));
        };
        Ok(match repository.load(key).await? {
            Some(stored) => Self::Available(stored),
            None => Self::NoAnalysisYet(surface),
        })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    pub fn sections(&self) -> Vec<ReportSection> {
        match self {
            Self::NoAnalysisYet(surface) => {
                let with = match surface {
                    Surface::Video => "a session with Dr. Sarah",
                    _ => "a conversation with MindfulChat",
                };
                vec![ReportSection::new(
                    "No Analysis Available",
                    vec![format!(
                        "You need to have {} before we can generate an analysis.",
                        with
                    )],
                )]
            }
            Self::Available(stored) => {
                let analysis = stored.analysis();
                let generated = stored.timestamp().with_timezone(&Local);

                let (status, explanation) = if analysis.problem_solved() {
                    ("Issue Addressed", SOLVED_TEXT)
                } else {
                    ("Needs Further Attention", UNSOLVED_TEXT)
                };

                vec![
                    ReportSection::new(
                        "Conversation Analysis",
                        vec![
                            format!("Based on {} messages", stored.message_count()),
                            format!("Generated {}", generated.format("%Y-%m-%d %H:%M")),
                        ],
                    ),
                    ReportSection::new("Emotional Assessment", vec![analysis.mood().to_string()]),
                    ReportSection::new(status, vec![explanation.to_string()]),
                    ReportSection::new(
                        "Key Insights",
                        analysis
                            .insights()
                            .iter()
                            .enumerate()
                            .map(|(i, insight)| format!("{}. {}", i + 1, insight))
                            .collect(),
                    ),
                    ReportSection::new(
                        "Recommendations",
                        analysis
                            .recommendations()
                            .iter()
                            .map(|rec| format!("- {}", rec))
                            .collect(),
                    ),
                ]
            }
        }
    }
}
