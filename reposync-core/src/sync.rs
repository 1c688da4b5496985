//! One synchronization cycle for a tracked repository
//!
//! A cycle clones the remote on first sight, and on every later call reopens
//! the local copy, optionally switches it to the requested branch, and
//! fast-forwards it. Re-running a cycle without upstream changes is a no-op.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::git::{
    remote_branch_ref, GitRepo, HandleOrigin, PullOptions, ResolvedBranch, TransportOptions,
    UpdateOutcome, DEFAULT_REMOTE,
};
use crate::{Error, Result};

/// Options recognized by a sync request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Branch to pin the working copy to
    pub revision: Option<String>,
}

/// What to synchronize and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    directory: PathBuf,
    remote_url: String,
    options: SyncOptions,
}

impl SyncRequest {
    /// Create a request; both the directory and URL must be non-empty
    pub fn new(directory: impl Into<PathBuf>, remote_url: impl Into<String>) -> Result<Self> {
        let directory = directory.into();
        let remote_url = remote_url.into();

        if directory.as_os_str().is_empty() {
            return Err(Error::InvalidRequest("directory is empty".to_string()));
        }
        if remote_url.trim().is_empty() {
            return Err(Error::InvalidRequest("remote URL is empty".to_string()));
        }

        Ok(Self {
            directory,
            remote_url,
            options: SyncOptions::default(),
        })
    }

    /// Pin the working copy to a branch (empty names are ignored)
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        let revision = revision.into();
        self.options.revision = (!revision.is_empty()).then_some(revision);
        self
    }

    /// Local directory of the working copy
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Remote to sync from
    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Requested branch, if any
    pub fn revision(&self) -> Option<&str> {
        self.options.revision.as_deref()
    }
}

/// Overall result of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The remote was cloned fresh
    Cloned,
    /// An existing copy received new commits
    Updated,
    /// An existing copy had nothing new
    AlreadyCurrent,
}

impl From<UpdateOutcome> for SyncOutcome {
    fn from(outcome: UpdateOutcome) -> Self {
        match outcome {
            UpdateOutcome::Updated => SyncOutcome::Updated,
            UpdateOutcome::AlreadyCurrent => SyncOutcome::AlreadyCurrent,
        }
    }
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncOutcome::Cloned => "cloned",
            SyncOutcome::Updated => "updated",
            SyncOutcome::AlreadyCurrent => "already up to date",
        };
        f.write_str(s)
    }
}

/// A synchronized working copy
#[derive(Debug)]
pub struct Synced {
    /// Handle to the working copy, valid for the rest of this cycle
    pub repo: GitRepo,
    /// What the cycle did
    pub outcome: SyncOutcome,
    /// Branch the copy was pinned to on reopen, if a revision was requested
    pub branch: Option<ResolvedBranch>,
}

/// Run one synchronization cycle
pub fn synchronize(request: &SyncRequest, transport: &TransportOptions) -> Result<Synced> {
    let url = request.remote_url();
    let revision = request.revision();

    let (repo, origin) = GitRepo::obtain(request.directory(), url, revision, transport)?;
    if origin == HandleOrigin::Cloned {
        return Ok(Synced {
            repo,
            outcome: SyncOutcome::Cloned,
            branch: None,
        });
    }

    let mut pull = PullOptions::new(transport.clone());
    let branch = match revision {
        Some(revision) => {
            let tracking = remote_branch_ref(DEFAULT_REMOTE, revision);
            if repo.inner().find_reference(&tracking).is_err() {
                debug!(branch = %tracking, "remote-tracking branch unknown, fetching first");
                repo.fetch(DEFAULT_REMOTE, transport)?;
            }

            let resolved = repo.resolve_branch(revision, DEFAULT_REMOTE)?;
            repo.checkout_branch(&resolved.reference, revision)?;
            pull = pull.with_reference(resolved.reference.clone());
            Some(resolved)
        }
        None => None,
    };

    let outcome = repo.pull(&pull)?;
    if outcome == UpdateOutcome::Updated {
        info!(url = %url, "found new update");
    }

    Ok(Synced {
        repo,
        outcome: outcome.into(),
        branch,
    })
}
