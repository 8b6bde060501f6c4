//! Conversation languages.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Language a surface converses in.
///
/// Parsing is case-insensitive on the lowercase English name
/// (`"english"`, `"hindi"`, `"tamil"`).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    English,
    Hindi,
    Tamil,
}

impl Language {
    /// BCP-47 tag handed to the speech collaborators.
    pub fn tag(self) -> &'static str {
        match self {
            Language::English => "en-US",
            Language::Hindi => "hi-IN",
            Language::Tamil => "ta-IN",
        }
    }

    /// Two-letter prefix of [`Language::tag`], used to match synthesis voices.
    pub fn prefix(self) -> &'static str {
        &self.tag()[..2]
    }

    /// Name shown in a language picker.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिंदी (Hindi)",
            Language::Tamil => "தமிழ் (Tamil)",
        }
    }
}
