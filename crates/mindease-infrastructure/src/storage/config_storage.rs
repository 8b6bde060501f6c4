//! config.toml loading.

use std::fs;
use std::path::{Path, PathBuf};

use mindease_core::MindEaseError;
use mindease_core::config::AppConfig;
use mindease_core::error::Result;

/// Reads `config.toml`. A missing or empty file yields `AppConfig::default()`.
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AppConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config.toml not found, using defaults");
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            MindEaseError::config(format!("{}: {}", self.path.display(), e))
        })
    }
}
