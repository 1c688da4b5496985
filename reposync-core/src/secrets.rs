//! Secrets management for reposync
//!
//! Credentials are stored separately from configuration to avoid accidental
//! sharing. The secrets file is located at `~/.config/reposync/secrets.toml`
//! and must have restrictive permissions (0600 on Unix).
//!
//! Loading priority:
//! 1. Environment variables (REPOSYNC_TOKEN)
//! 2. Secrets file (~/.config/reposync/secrets.toml)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Environment variable holding the remote token
pub const TOKEN_ENV: &str = "REPOSYNC_TOKEN";

/// Secrets structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// Remote credentials
    pub remote: RemoteSecrets,
}

/// Credentials for the git remote
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteSecrets {
    /// Personal access token or password used for HTTPS remotes
    pub token: Option<String>,
}

impl std::fmt::Debug for RemoteSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSecrets")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the default location
    ///
    /// Returns default (empty) secrets if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_secrets_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific file with permission checking
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let metadata = std::fs::metadata(path).map_err(Error::Io)?;
            let mode = metadata.permissions().mode();

            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. \
                     Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }

            debug!(path = %path.display(), mode = format!("{:o}", mode & 0o777), "Secrets file permissions OK");
        }

        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(ref mut token) = secrets.remote.token {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Get the default secrets file path
    ///
    /// Returns `~/.config/reposync/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("reposync").join("secrets.toml"))
    }

    /// Get the remote token with environment variable override
    ///
    /// Priority: REPOSYNC_TOKEN env var > secrets file
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                debug!("Using remote token from {} environment variable", TOKEN_ENV);
                return Some(token);
            }
        }

        self.file_token()
    }

    fn file_token(&self) -> Option<String> {
        match self.remote.token {
            Some(ref token) if !token.is_empty() => {
                debug!("Using remote token from secrets file");
                Some(token.clone())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_secrets() {
        let secrets = Secrets::default();
        assert!(secrets.remote.token.is_none());
        assert!(secrets.file_token().is_none());
    }

    #[test]
    fn test_parse_secrets() {
        let toml = r#"
[remote]
token = "glpat-xxxxxxxx"
"#;
        let secrets: Secrets = toml::from_str(toml).unwrap();
        assert_eq!(secrets.file_token(), Some("glpat-xxxxxxxx".to_string()));
    }

    #[test]
    fn test_empty_token_ignored() {
        let secrets = Secrets {
            remote: RemoteSecrets {
                token: Some(String::new()),
            },
        };
        assert!(secrets.file_token().is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let secrets = Secrets {
            remote: RemoteSecrets {
                token: Some("hunter2".to_string()),
            },
        };
        assert!(!format!("{:?}", secrets).contains("hunter2"));
    }

    #[cfg(unix)]
    #[test]
    fn test_insecure_permissions_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[remote]\ntoken = \"test\"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o644);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let result = Secrets::load_from_file(file.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("insecure permissions"));
    }

    #[cfg(unix)]
    #[test]
    fn test_secure_permissions_accepted_and_trimmed() {
        use std::os::unix::fs::PermissionsExt;

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[remote]\ntoken = \"  tok_test  \"").unwrap();

        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(file.path(), perms).unwrap();

        let secrets = Secrets::load_from_file(file.path()).unwrap();
        assert_eq!(secrets.remote.token, Some("tok_test".to_string()));
    }
}
