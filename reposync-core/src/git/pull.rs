//! Fetching from the remote and fast-forwarding the local branch

use git2::build::CheckoutBuilder;
use git2::{ErrorCode, Oid, ReferenceType, Repository};
use tracing::debug;

use super::branch::remote_branch_ref;
use super::repo::GitRepo;
use super::transport::TransportOptions;
use crate::{Error, Result};

/// Default remote name
pub const DEFAULT_REMOTE: &str = "origin";

/// Result of a pull that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// New commits were fast-forwarded into the branch
    Updated,
    /// Nothing new to merge
    AlreadyCurrent,
}

/// Options for pulling into a working copy
#[derive(Debug, Clone)]
pub struct PullOptions {
    /// Remote to fetch from
    pub remote_name: String,
    /// Local branch to update; `None` means the branch HEAD points at
    pub reference_name: Option<String>,
    /// Credentials and callbacks for the fetch
    pub transport: TransportOptions,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            remote_name: DEFAULT_REMOTE.to_string(),
            reference_name: None,
            transport: TransportOptions::default(),
        }
    }
}

impl PullOptions {
    /// Pull from `origin` with the given transport settings
    pub fn new(transport: TransportOptions) -> Self {
        Self {
            transport,
            ..Self::default()
        }
    }

    /// Scope the pull to a specific local branch reference
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference_name = Some(reference.into());
        self
    }
}

impl GitRepo {
    /// Fetch a remote using its configured refspecs
    pub fn fetch(&self, remote_name: &str, transport: &TransportOptions) -> Result<()> {
        let mut remote = self.inner().find_remote(remote_name).map_err(Error::Pull)?;
        let mut fetch_options = transport.fetch_options();

        remote
            .fetch(&[] as &[&str], Some(&mut fetch_options), None)
            .map_err(Error::Pull)?;

        Ok(())
    }

    /// Fetch and fast-forward the target branch
    ///
    /// "Nothing new" is reported as [`UpdateOutcome::AlreadyCurrent`], as is a
    /// local branch that is already ahead of its remote. Diverged history is
    /// an error; no merge commits are ever created.
    pub fn pull(&self, options: &PullOptions) -> Result<UpdateOutcome> {
        let repo = self.inner();
        let head_target = head_symbolic_target(repo)?;
        let branch_ref = match options.reference_name {
            Some(ref name) => name.clone(),
            None => head_target.clone().ok_or_else(|| {
                Error::Pull(git2::Error::from_str("HEAD is detached, nothing to pull into"))
            })?,
        };
        let branch = branch_ref.strip_prefix("refs/heads/").ok_or_else(|| {
            Error::Pull(git2::Error::from_str(&format!(
                "{} is not a local branch",
                branch_ref
            )))
        })?;

        let local = materialize_branch(repo, &branch_ref)?;

        self.fetch(&options.remote_name, &options.transport)?;

        let tracking_ref = remote_branch_ref(&options.remote_name, branch);
        let remote = repo.refname_to_id(&tracking_ref).map_err(Error::Pull)?;

        if let Some(local) = local {
            if local == remote {
                debug!(branch = %branch_ref, "already up to date");
                return Ok(UpdateOutcome::AlreadyCurrent);
            }
            if repo.graph_descendant_of(local, remote).map_err(Error::Pull)? {
                debug!(branch = %branch_ref, "local branch is ahead of {}", tracking_ref);
                return Ok(UpdateOutcome::AlreadyCurrent);
            }
            if !repo.graph_descendant_of(remote, local).map_err(Error::Pull)? {
                return Err(Error::NonFastForward(branch_ref));
            }
        }

        if head_target.as_deref() == Some(branch_ref.as_str()) {
            let commit = repo.find_commit(remote).map_err(Error::Pull)?;
            let mut checkout = CheckoutBuilder::new();
            checkout.safe();
            repo.checkout_tree(commit.as_object(), Some(&mut checkout))
                .map_err(Error::Pull)?;
        }
        repo.reference(
            &branch_ref,
            remote,
            true,
            &format!("pull: fast-forward to {}", remote),
        )
        .map_err(Error::Pull)?;

        debug!(branch = %branch_ref, commit = %remote, "fast-forwarded");
        Ok(UpdateOutcome::Updated)
    }
}

/// Name of the branch HEAD points at, `None` when detached
fn head_symbolic_target(repo: &Repository) -> Result<Option<String>> {
    let head = repo.find_reference("HEAD").map_err(Error::Pull)?;
    Ok(head.symbolic_target().map(|s| s.to_string()))
}

/// Current tip of a local branch, replacing a symbolic alias with a direct reference
///
/// Returns `None` for a branch that does not exist yet.
fn materialize_branch(repo: &Repository, branch_ref: &str) -> Result<Option<Oid>> {
    let reference = match repo.find_reference(branch_ref) {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(Error::Pull(e)),
    };

    if reference.kind() != Some(ReferenceType::Symbolic) {
        return Ok(reference.target());
    }

    let oid = match reference.resolve() {
        Ok(resolved) => resolved.target(),
        Err(e) if e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(Error::Pull(e)),
    };
    if let Some(oid) = oid {
        repo.reference(branch_ref, oid, true, "reposync: pin tracking branch")
            .map_err(Error::Pull)?;
        debug!(branch = %branch_ref, commit = %oid, "converted symbolic branch to direct");
    }
    Ok(oid)
}
