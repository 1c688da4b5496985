//! Remote URL parsing and default checkout locations

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Parsed repository information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    /// Repository owner/organization
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Full clone URL
    pub clone_url: String,
    /// Host (e.g., "github.com")
    pub host: String,
}

impl RepoUrl {
    /// Parse a repository URL or shorthand
    ///
    /// Supports:
    /// - `https://github.com/owner/repo`
    /// - `https://github.com/owner/repo.git`
    /// - `git@github.com:owner/repo.git`
    /// - `owner/repo` (assumes GitHub)
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        // owner/repo shorthand
        if !input.contains("://") && !input.contains('@') && input.contains('/') {
            let parts: Vec<&str> = input.split('/').collect();
            if parts.len() == 2 && parts.iter().all(|p| !p.is_empty()) {
                let owner = parts[0].to_string();
                let repo = parts[1].trim_end_matches(".git").to_string();
                return Ok(Self {
                    clone_url: format!("https://github.com/{}/{}.git", owner, repo),
                    owner,
                    repo,
                    host: "github.com".to_string(),
                });
            }
        }

        // scp-like SSH (git@host:owner/repo.git)
        if let Some(rest) = input.strip_prefix("git@") {
            if let Some((host, path)) = rest.split_once(':') {
                let path = path.trim_end_matches(".git");
                if let Some((owner, repo)) = owner_and_repo(path) {
                    return Ok(Self {
                        owner,
                        repo,
                        clone_url: input.to_string(),
                        host: host.to_string(),
                    });
                }
            }
        }

        if input.starts_with("https://")
            || input.starts_with("http://")
            || input.starts_with("ssh://")
        {
            if let Ok(url) = url::Url::parse(input) {
                let host = url.host_str().unwrap_or("").to_string();
                let path = url
                    .path()
                    .trim_matches('/')
                    .trim_end_matches(".git");

                if let Some((owner, repo)) = owner_and_repo(path) {
                    let base = input.trim_end_matches('/');
                    let clone_url = if base.ends_with(".git") || url.scheme() == "ssh" {
                        base.to_string()
                    } else {
                        format!("{}.git", base)
                    };

                    return Ok(Self {
                        owner,
                        repo,
                        clone_url,
                        host,
                    });
                }
            }
        }

        Err(Error::Config(format!(
            "Invalid repository URL: {}. Expected format: owner/repo, https://github.com/owner/repo, or git@github.com:owner/repo.git",
            input
        )))
    }

    /// Where this repository lives under a checkout root (`<root>/<owner>/<repo>`)
    pub fn checkout_path(&self, root: &Path) -> PathBuf {
        root.join(&self.owner).join(&self.repo)
    }
}

fn owner_and_repo(path: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = path.split('/').collect();
    if parts.len() >= 2 && !parts[0].is_empty() && !parts[1].is_empty() {
        Some((parts[0].to_string(), parts[1].to_string()))
    } else {
        None
    }
}

/// Get the default checkout root
///
/// Returns `~/.cache/reposync/repos`
pub fn default_repos_cache_dir() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| Error::Config("Could not determine cache directory".to_string()))?;

    Ok(cache_dir.join("reposync").join("repos"))
}
