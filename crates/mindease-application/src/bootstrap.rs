//! Wiring of configuration, secrets, storage and the completion client.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use mindease_core::analysis::AnalysisRepository;
use mindease_core::completion::CompletionClient;
use mindease_core::config::AppConfig;
use mindease_infrastructure::storage::ConfigStorage;
use mindease_infrastructure::{
    FileAnalysisRepository, InMemoryAnalysisRepository, MindEasePaths, SecretServiceImpl,
};
use mindease_interaction::GeminiApiClient;

use crate::orchestrator::SessionLimits;
use crate::profile::SurfaceProfile;

/// Everything a surface needs besides its profile.
pub struct AppContext {
    paths: MindEasePaths,
    config: AppConfig,
    secrets: Arc<SecretServiceImpl>,
    repository: Arc<dyn AnalysisRepository>,
}

impl AppContext {
    /// Loads `config.toml` and prepares secrets and storage.
    ///
    /// `ephemeral` keeps analyses in memory instead of the data directory.
    pub fn load(base: Option<&Path>, ephemeral: bool) -> Result<Self> {
        let paths = MindEasePaths::new(base);
        let config_file = paths
            .config_file()
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        let config = ConfigStorage::new(config_file)
            .load()
            .context("Failed to load config.toml")?;

        let secrets = Arc::new(SecretServiceImpl::new(&paths)?);

        let repository: Arc<dyn AnalysisRepository> = if ephemeral {
            Arc::new(InMemoryAnalysisRepository::new())
        } else {
            Arc::new(FileAnalysisRepository::from_paths(&paths)?)
        };

        tracing::debug!(model = %config.gemini.model, ephemeral, "application context loaded");

        Ok(Self {
            paths,
            config,
            secrets,
            repository,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn repository(&self) -> Arc<dyn AnalysisRepository> {
        Arc::clone(&self.repository)
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_turns: self.config.session.max_turns,
        }
    }

    /// Builds a Gemini client carrying `profile`'s fallback table.
    pub async fn completion_client(&self, profile: &SurfaceProfile) -> Result<Arc<dyn CompletionClient>> {
        let client = GeminiApiClient::from_secrets(
            self.secrets.as_ref(),
            &self.config.gemini,
            profile.fallbacks().clone(),
        )
        .await?;
        tracing::debug!(model = client.model(), surface = %profile.surface(), "completion client ready");
        Ok(Arc::new(client))
    }

    /// Creates secret.json from a template when missing.
    pub fn init_secret_file(&self) -> Result<(PathBuf, bool)> {
        self.paths
            .ensure_secret_file()
            .context("Failed to create secret.json")
    }
}
