//! Repository handle: clone fresh or reopen an existing local copy

use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use git2::{ErrorCode, Repository};
use tracing::{debug, info};

use super::transport::TransportOptions;
use crate::{Error, Result};

/// How a handle was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOrigin {
    /// The remote was cloned into an empty destination
    Cloned,
    /// A repository already existed at the destination and was opened
    Opened,
}

/// A git working copy wrapper providing reposync-specific operations
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Path to the working tree root
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Clone `url` into `directory`, or open the repository already there
    ///
    /// An existing destination is the normal case for every call after the
    /// first and is not reported as an error. When `branch` is given, a fresh
    /// clone checks that branch out and configures it to track `origin`.
    pub fn obtain(
        directory: impl AsRef<Path>,
        url: &str,
        branch: Option<&str>,
        transport: &TransportOptions,
    ) -> Result<(Self, HandleOrigin)> {
        let directory = directory.as_ref();

        match Self::clone_remote(directory, url, branch, transport) {
            Ok(repo) => {
                info!(url = %url, "found new repo");
                Ok((repo, HandleOrigin::Cloned))
            }
            Err(Error::Clone(e)) if e.code() == ErrorCode::Exists => {
                debug!(path = %directory.display(), "destination exists, reopening");
                Ok((Self::open(directory)?, HandleOrigin::Opened))
            }
            Err(e) => Err(e),
        }
    }

    /// Clone a remote repository into `directory`
    pub fn clone_remote(
        directory: &Path,
        url: &str,
        branch: Option<&str>,
        transport: &TransportOptions,
    ) -> Result<Self> {
        if let Some(parent) = directory.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Clone(git2::Error::from_str(&format!(
                    "create {}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let mut builder = RepoBuilder::new();
        builder.fetch_options(transport.fetch_options());
        if let Some(branch) = branch {
            builder.branch(branch);
        }

        let repo = builder.clone(url, directory).map_err(Error::Clone)?;
        Self::from_repository(repo)
    }

    /// Open the repository rooted exactly at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::open(path.as_ref()).map_err(Error::Open)?;
        Self::from_repository(repo)
    }

    fn from_repository(repo: Repository) -> Result<Self> {
        let root = repo
            .workdir()
            .ok_or_else(|| Error::Config("Bare repositories are not supported".to_string()))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Get the working tree root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check if the given path is the root of a git repository
    pub fn is_git_repo(path: impl AsRef<Path>) -> bool {
        Repository::open(path.as_ref()).is_ok()
    }

    /// URL configured for a remote, falling back to the remote name itself
    pub fn remote_url(&self, remote_name: &str) -> String {
        self.repo
            .find_remote(remote_name)
            .ok()
            .and_then(|remote| remote.url().map(|u| u.to_string()))
            .unwrap_or_else(|| remote_name.to_string())
    }

    /// Get the current branch name
    ///
    /// Only the first hop of HEAD is read, so a branch that is itself an alias
    /// of a remote-tracking ref still reports its own name.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = self.repo.find_reference("HEAD").map_err(Error::Head)?;

        // Detached HEAD has no symbolic target
        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(|name| name.to_string()))
    }

    /// Get access to the underlying git2 repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{commit_file, init_upstream, url_of};
    use tempfile::TempDir;

    #[test]
    fn test_obtain_clones_then_reopens() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        commit_file(&upstream, "main", "README", "hello", 1_700_000_000);
        let dir = temp.path().join("work");
        let transport = TransportOptions::default();

        let (repo, origin) = GitRepo::obtain(&dir, &url_of(&upstream), None, &transport).unwrap();
        assert_eq!(origin, HandleOrigin::Cloned);
        assert!(repo.root().join("README").exists());
        drop(repo);

        let (repo, origin) = GitRepo::obtain(&dir, &url_of(&upstream), None, &transport).unwrap();
        assert_eq!(origin, HandleOrigin::Opened);
        assert_eq!(repo.current_branch().unwrap(), Some("main".to_string()));
    }

    #[test]
    fn test_obtain_non_repo_directory_fails_to_open() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        commit_file(&upstream, "main", "README", "hello", 1_700_000_000);
        let dir = temp.path().join("occupied");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("stray.txt"), "not a repo").unwrap();

        let err = GitRepo::obtain(&dir, &url_of(&upstream), None, &TransportOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Open(_)));
        assert!(err.to_string().starts_with("plain open"));
    }

    #[test]
    fn test_clone_failure_is_wrapped() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("no-such-upstream");
        let dir = temp.path().join("work");

        let err = GitRepo::obtain(
            &dir,
            missing.to_str().unwrap(),
            None,
            &TransportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Clone(_)));
    }

    #[test]
    fn test_unwritable_parent_is_a_clone_error() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        commit_file(&upstream, "main", "README", "hello", 1_700_000_000);
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "a file, not a directory").unwrap();

        let err = GitRepo::obtain(
            blocker.join("nested").join("work"),
            &url_of(&upstream),
            None,
            &TransportOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Clone(_)));
        assert!(err.to_string().starts_with("plain clone"));
    }

    #[test]
    fn test_current_branch_through_alias_and_detached() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        let tip = commit_file(&upstream, "main", "README", "hello", 1_700_000_000);
        let dir = temp.path().join("work");
        let repo = GitRepo::clone_remote(&dir, &url_of(&upstream), None, &TransportOptions::default())
            .unwrap();

        repo.inner()
            .reference_symbolic(
                "refs/heads/mirror",
                "refs/remotes/origin/main",
                false,
                "alias",
            )
            .unwrap();
        repo.inner().set_head("refs/heads/mirror").unwrap();
        assert_eq!(repo.current_branch().unwrap(), Some("mirror".to_string()));

        repo.inner().set_head_detached(tip).unwrap();
        assert_eq!(repo.current_branch().unwrap(), None);
    }

    #[test]
    fn test_open_non_git_dir() {
        let temp = TempDir::new().unwrap();
        assert!(!GitRepo::is_git_repo(temp.path()));
        assert!(matches!(GitRepo::open(temp.path()), Err(Error::Open(_))));
    }

    #[test]
    fn test_remote_url_falls_back_to_name() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        commit_file(&upstream, "main", "README", "hello", 1_700_000_000);
        let dir = temp.path().join("work");
        let repo = GitRepo::clone_remote(&dir, &url_of(&upstream), None, &TransportOptions::default())
            .unwrap();

        assert_eq!(repo.remote_url("origin"), url_of(&upstream));
        assert_eq!(repo.remote_url("upstream"), "upstream");
    }
}
