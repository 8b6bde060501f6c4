//! Secret service implementation.
//!
//! `GEMINI_API_KEY` in the environment overrides the key in secret.json; the
//! model name still comes from the file when present.

use mindease_core::config::{GeminiConfig, SecretConfig};
use mindease_core::secret::SecretService;
use tokio::sync::RwLock;

use crate::paths::MindEasePaths;
use crate::storage::{SecretStorage, SecretStorageError};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Loads secrets once and caches them for the process lifetime.
pub struct SecretServiceImpl {
    storage: SecretStorage,
    env_api_key: Option<String>,
    cache: RwLock<Option<SecretConfig>>,
}

impl SecretServiceImpl {
    /// Reads the override from `GEMINI_API_KEY`.
    pub fn new(paths: &MindEasePaths) -> anyhow::Result<Self> {
        let storage = SecretStorage::new(paths).map_err(|e| anyhow::anyhow!("{}", e))?;
        let env_api_key = std::env::var(API_KEY_ENV).ok();
        Ok(Self::with_storage(storage, env_api_key))
    }

    pub fn with_storage(storage: SecretStorage, env_api_key: Option<String>) -> Self {
        Self {
            storage,
            env_api_key: env_api_key.filter(|key| !key.trim().is_empty()),
            cache: RwLock::new(None),
        }
    }

    fn resolve(&self) -> Result<SecretConfig, String> {
        let from_file = match self.storage.load() {
            Ok(config) => Some(config),
            Err(SecretStorageError::NotFound(_)) if self.env_api_key.is_some() => None,
            Err(e) => return Err(e.to_string()),
        };

        let Some(api_key) = self.env_api_key.clone() else {
            return from_file.ok_or_else(|| "no secret configuration available".to_string());
        };

        tracing::debug!("using Gemini API key from {}", API_KEY_ENV);
        let model_name = from_file
            .and_then(|config| config.gemini)
            .and_then(|gemini| gemini.model_name);

        Ok(SecretConfig {
            gemini: Some(GeminiConfig { api_key, model_name }),
        })
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let loaded = self.resolve()?;
        *self.cache.write().await = Some(loaded.clone());
        Ok(loaded)
    }

    async fn secret_file_exists(&self) -> bool {
        self.storage.path().exists()
    }
}
