//! `AnalysisRepository` implementations.
//!
//! `FileAnalysisRepository` keeps one `<key>.json` per surface under the
//! analysis directory. `InMemoryAnalysisRepository` backs tests and
//! `--ephemeral` sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mindease_core::MindEaseError;
use mindease_core::analysis::{AnalysisRepository, StoredAnalysis};
use mindease_core::error::Result;
use tokio::sync::RwLock;

use crate::paths::MindEasePaths;
use crate::storage::{AtomicJsonError, AtomicJsonFile};

/// Rejects keys that could escape the analysis directory.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(MindEaseError::invalid_input(format!("invalid analysis key '{}'", key)))
    }
}

pub struct FileAnalysisRepository {
    dir: PathBuf,
}

impl FileAnalysisRepository {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn from_paths(paths: &MindEasePaths) -> Result<Self> {
        let dir = paths
            .analysis_dir()
            .map_err(|e| MindEaseError::config(e.to_string()))?;
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, key: &str) -> AtomicJsonFile<StoredAnalysis> {
        AtomicJsonFile::new(self.dir.join(format!("{}.json", key)))
    }
}

/// Runs blocking file work (locking, fsync, rename) off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| MindEaseError::internal(format!("analysis file task failed: {}", e)))?
}

#[async_trait]
impl AnalysisRepository for FileAnalysisRepository {
    async fn save(&self, key: &str, record: &StoredAnalysis) -> Result<()> {
        validate_key(key)?;
        let file = self.file(key);
        let owned = record.clone();
        blocking(move || {
            file.save(&owned).map_err(|e| match e {
                AtomicJsonError::IoError(io) => MindEaseError::from(io),
                other => MindEaseError::data_access(other.to_string()),
            })
        })
        .await?;
        tracing::debug!(key, message_count = record.message_count(), "analysis saved");
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<StoredAnalysis>> {
        validate_key(key)?;
        let file = self.file(key);
        let key = key.to_string();
        blocking(move || match file.load() {
            Ok(record) => Ok(record),
            Err(AtomicJsonError::JsonError(e)) => {
                tracing::warn!(
                    key = %key,
                    path = %file.path().display(),
                    error = %e,
                    "stored analysis is corrupt, treating as absent"
                );
                Ok(None)
            }
            Err(AtomicJsonError::IoError(e)) => Err(e.into()),
            Err(other) => Err(MindEaseError::data_access(other.to_string())),
        })
        .await
    }
}

#[derive(Default)]
pub struct InMemoryAnalysisRepository {
    records: RwLock<HashMap<String, StoredAnalysis>>,
}

impl InMemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn save(&self, key: &str, record: &StoredAnalysis) -> Result<()> {
        validate_key(key)?;
        self.records
            .write()
            .await
            .insert(key.to_string(), record.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<StoredAnalysis>> {
        validate_key(key)?;
        Ok(self.records.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mindease_core::analysis::{AnalysisExtractor, CHAT_ANALYSIS_KEY, VIDEO_ANALYSIS_KEY};
    use tempfile::TempDir;

    fn stored(mood: &str, count: usize) -> StoredAnalysis {
        let raw = format!(
            r#"{{"mood":"{}","problemSolved":false,"insights":["a","b","c"],"recommendations":["x","y"]}}"#,
            mood
        );
        let record = AnalysisExtractor::new().extract(&raw).unwrap();
        StoredAnalysis::new(record, Utc::now(), count)
    }

    #[tokio::test]
    async fn file_repository_round_trips_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let repo = FileAnalysisRepository::new(temp.path().join("analysis"));

        assert!(repo.load(CHAT_ANALYSIS_KEY).await.unwrap().is_none());

        repo.save(CHAT_ANALYSIS_KEY, &stored("anxious", 5)).await.unwrap();
        repo.save(CHAT_ANALYSIS_KEY, &stored("calm", 9)).await.unwrap();

        let loaded = repo.load(CHAT_ANALYSIS_KEY).await.unwrap().unwrap();
        assert_eq!(loaded.analysis().mood(), "calm");
        assert_eq!(loaded.message_count(), 9);
        assert!(temp.path().join("analysis/conversationAnalysis.json").exists());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let temp = TempDir::new().unwrap();
        let repo = FileAnalysisRepository::new(temp.path().to_path_buf());

        repo.save(VIDEO_ANALYSIS_KEY, &stored("sad", 3)).await.unwrap();

        assert!(repo.load(CHAT_ANALYSIS_KEY).await.unwrap().is_none());
        assert!(repo.load(VIDEO_ANALYSIS_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn corrupt_record_loads_as_absent() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("conversationAnalysis.json"), "{\"analysis\": 12").unwrap();
        let repo = FileAnalysisRepository::new(temp.path().to_path_buf());

        assert!(repo.load(CHAT_ANALYSIS_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_like_keys_are_rejected() {
        let repo = InMemoryAnalysisRepository::new();
        let err = repo.save("../escape", &stored("calm", 1)).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert!(repo.load("").await.unwrap_err().is_invalid_input());
    }

    #[tokio::test]
    async fn in_memory_repository_overwrites() {
        let repo = InMemoryAnalysisRepository::new();
        repo.save(CHAT_ANALYSIS_KEY, &stored("anxious", 5)).await.unwrap();
        repo.save(CHAT_ANALYSIS_KEY, &stored("happy", 7)).await.unwrap();

        let loaded = repo.load(CHAT_ANALYSIS_KEY).await.unwrap().unwrap();
        assert_eq!(loaded.analysis().mood(), "happy");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_saves_leave_one_complete_record() {
        let temp = TempDir::new().unwrap();
        let repo = std::sync::Arc::new(FileAnalysisRepository::new(temp.path().to_path_buf()));

        let writers: Vec<_> = (1..=8)
            .map(|count| {
                let repo = std::sync::Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.save(CHAT_ANALYSIS_KEY, &stored("calm", count)).await
                })
            })
            .collect();
        let reader = {
            let repo = std::sync::Arc::clone(&repo);
            tokio::spawn(async move { repo.load(CHAT_ANALYSIS_KEY).await })
        };

        for writer in writers {
            writer.await.unwrap().unwrap();
        }
        reader.await.unwrap().unwrap();

        let loaded = repo.load(CHAT_ANALYSIS_KEY).await.unwrap().unwrap();
        assert!((1..=8).contains(&loaded.message_count()));
    }
}
