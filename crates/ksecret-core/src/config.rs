//! Configuration management for ksecret

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::Paths;

/// Placeholder address written into docker registry credentials
pub const DEFAULT_DOCKER_EMAIL: &str = "mail@example.de";

/// Global ksecret configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Store file used when `--database` and `KSDATABASE` are absent
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Email written into generated docker config secrets
    #[serde(default = "default_docker_email")]
    pub docker_email: String,
}

fn default_docker_email() -> String {
    DEFAULT_DOCKER_EMAIL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            docker_email: default_docker_email(),
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Load config from the standard location
    pub fn load_default(paths: &Paths) -> Result<Self> {
        Self::load(&paths.config_file())
    }

    /// Store file from config, or the standard default
    pub fn database_or_default(&self, paths: &Paths) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| paths.default_store())
    }
}
