//! The three conversational surfaces.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::analysis::{CHAT_ANALYSIS_KEY, VIDEO_ANALYSIS_KEY};

#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum Surface {
    Chat,
    Audio,
    Video,
}

impl Surface {
    /// Storage key of the surface's analysis; the audio surface keeps none.
    pub fn analysis_key(self) -> Option<&'static str> {
        match self {
            Surface::Chat => Some(CHAT_ANALYSIS_KEY),
            Surface::Audio => None,
            Surface::Video => Some(VIDEO_ANALYSIS_KEY),
        }
    }
}
