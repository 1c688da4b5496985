//! Resolving a requested revision to a local tracking branch

use git2::{ErrorCode, Reference};
use tracing::debug;

use super::repo::GitRepo;
use crate::{Error, Result};

/// Outcome of resolving a revision name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBranch {
    /// Local reference name to check out and pull into (e.g. `refs/heads/release`)
    pub reference: String,
    /// Whether the tracking branch had to be created on this call
    pub created: bool,
}

/// Full reference name of a local branch
pub fn local_branch_ref(branch: &str) -> String {
    format!("refs/heads/{}", branch)
}

/// Full reference name of a remote-tracking branch
pub fn remote_branch_ref(remote_name: &str, branch: &str) -> String {
    format!("refs/remotes/{}/{}", remote_name, branch)
}

impl GitRepo {
    /// Resolve `revision` to the local branch that tracks it on `remote_name`
    ///
    /// If the branch already has an upstream configured, its merge reference
    /// is returned as-is. Otherwise the upstream configuration is written and
    /// the local branch is created as a symbolic reference onto the
    /// remote-tracking branch, so no fetch is needed beforehand.
    pub fn resolve_branch(&self, revision: &str, remote_name: &str) -> Result<ResolvedBranch> {
        if let Some(merge) = self.branch_merge_ref(revision)? {
            debug!(revision = %revision, merge = %merge, "found existing tracking branch");
            return Ok(ResolvedBranch {
                reference: merge,
                created: false,
            });
        }

        let url = self.remote_url(remote_name);
        let wrap = |source: git2::Error| Error::CreateBranch {
            url: url.clone(),
            source,
        };

        let local_ref = local_branch_ref(revision);
        if !Reference::is_valid_name(&local_ref) {
            return Err(wrap(git2::Error::from_str(&format!(
                "invalid branch name '{}'",
                revision
            ))));
        }

        let repo = self.inner();
        let mut config = repo.config().map_err(wrap)?;
        config
            .set_str(&format!("branch.{}.remote", revision), remote_name)
            .map_err(wrap)?;
        config
            .set_str(&format!("branch.{}.merge", revision), &local_ref)
            .map_err(wrap)?;

        match repo.find_reference(&local_ref) {
            Ok(_) => {
                debug!(branch = %local_ref, "local branch exists, only upstream was configured");
            }
            Err(e) if e.code() == ErrorCode::NotFound => {
                let remote_ref = remote_branch_ref(remote_name, revision);
                repo.reference_symbolic(
                    &local_ref,
                    &remote_ref,
                    false,
                    &format!("reposync: track {}", remote_ref),
                )
                .map_err(wrap)?;
                debug!(branch = %local_ref, upstream = %remote_ref, "created tracking branch");
            }
            Err(e) => return Err(wrap(e)),
        }

        Ok(ResolvedBranch {
            reference: local_ref,
            created: true,
        })
    }

    /// Configured upstream (remote name, merge reference) of a local branch
    pub fn branch_upstream(&self, branch: &str) -> Result<Option<(String, String)>> {
        let remote = self.config_string(&format!("branch.{}.remote", branch))?;
        let merge = self.branch_merge_ref(branch)?;
        Ok(remote.zip(merge))
    }

    fn branch_merge_ref(&self, branch: &str) -> Result<Option<String>> {
        self.config_string(&format!("branch.{}.merge", branch))
    }

    fn config_string(&self, key: &str) -> Result<Option<String>> {
        let config = self
            .inner()
            .config()
            .map_err(|e| Error::Config(format!("Failed to read repository config: {}", e)))?;

        match config.get_string(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(Error::Config(format!("Failed to read {}: {}", key, e))),
        }
    }
}
