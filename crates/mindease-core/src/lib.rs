//! Domain layer for MindEase.
//!
//! Holds the conversation and analysis types, the JSON analysis extractor, and
//! the traits behind which every external collaborator sits (completion
//! backend, analysis storage, speech, media, secrets).

pub mod analysis;
pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod language;
pub mod media;
pub mod mood;
pub mod secret;
pub mod speech;
pub mod surface;

pub use error::MindEaseError;
pub use language::Language;
pub use surface::Surface;
