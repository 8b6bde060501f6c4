//! Analysis repository trait.

use async_trait::async_trait;

use super::record::StoredAnalysis;
use crate::error::Result;

/// Durable key-value storage for the latest analysis of each surface.
///
/// # Implementation Notes
///
/// - `save` overwrites any existing record under the key; there is no merge
///   and no history.
/// - `load` returns `Ok(None)` for a key that was never saved. Absence is not
///   an error; viewers render a "no analysis yet" state.
#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Replaces the record stored under `key`.
    async fn save(&self, key: &str, record: &StoredAnalysis) -> Result<()>;

    /// Returns the record stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<StoredAnalysis>>;
}
