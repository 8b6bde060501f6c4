//! Camera/microphone capture seam.
//!
//! Media state is displayed next to a transcript but never influences it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Camera,
    Microphone,
}

/// A live capture handle returned by [`MediaDevice::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    pub id: String,
    pub kind: MediaKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("permission denied for {0:?}")]
    PermissionDenied(MediaKind),
    #[error("device unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MediaDevice: Send + Sync {
    async fn start(&self, kind: MediaKind) -> Result<MediaHandle, MediaError>;

    /// Stops every track behind the handle.
    async fn stop(&self, handle: MediaHandle);
}
