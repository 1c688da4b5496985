//! Configuration management for reposync
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (REPOSYNC_*)
//! 3. Config file (~/.config/reposync/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::git::{default_repos_cache_dir, RepoUrl, TransportOptions};
use crate::sync::SyncRequest;
use crate::{Error, Result};

/// Sync-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Deadline for one repository's sync cycle
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,

    /// Root under which repositories without an explicit directory are checked out
    pub cache_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5 * 60),
            cache_dir: None,
        }
    }
}

/// Transport configuration (secrets live in secrets.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Username for HTTPS authentication
    pub username: Option<String>,
}

/// A repository to keep in sync
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Remote URL or owner/repo shorthand
    pub url: String,

    /// Local directory (defaults to `<cache_dir>/<owner>/<repo>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Branch to pin to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
}

impl RepositoryConfig {
    /// Build the sync request for this entry
    pub fn to_request(&self, cache_dir: &Path) -> Result<SyncRequest> {
        let (directory, url) = match self.directory {
            Some(ref dir) => (dir.clone(), self.url.clone()),
            None => {
                let parsed = RepoUrl::parse(&self.url)?;
                (parsed.checkout_path(cache_dir), parsed.clone_url)
            }
        };

        let request = SyncRequest::new(directory, url)?;
        Ok(match self.revision {
            Some(ref revision) => request.with_revision(revision.clone()),
            None => request,
        })
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Sync configuration
    pub sync: SyncConfig,

    /// Transport configuration
    pub transport: TransportConfig,

    /// Repositories synchronized by `sync --all`
    #[serde(rename = "repository", skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<RepositoryConfig>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/reposync/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reposync").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - REPOSYNC_USERNAME: HTTPS username
    /// - REPOSYNC_CACHE_DIR: checkout root
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(username) = std::env::var("REPOSYNC_USERNAME") {
            self.transport.username = Some(username);
        }

        if let Ok(cache_dir) = std::env::var("REPOSYNC_CACHE_DIR") {
            self.sync.cache_dir = Some(PathBuf::from(cache_dir));
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, timeout: Option<Duration>, cache_dir: Option<PathBuf>) -> Self {
        if let Some(timeout) = timeout {
            self.sync.timeout = timeout;
        }

        if let Some(dir) = cache_dir {
            self.sync.cache_dir = Some(dir);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(timeout: Option<Duration>, cache_dir: Option<PathBuf>) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(timeout, cache_dir))
    }

    /// Effective checkout root
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match self.sync.cache_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => default_repos_cache_dir(),
        }
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Other(format!("Failed to serialize config: {}", e)))
    }

    /// Transport options from configuration plus an optional token
    pub fn transport_options(&self, token: Option<String>) -> TransportOptions {
        TransportOptions {
            username: self.transport.username.clone(),
            token,
        }
    }
}
