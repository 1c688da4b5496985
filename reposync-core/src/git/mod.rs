//! Git operations for reposync
//!
//! This module provides the pieces a sync cycle is made of: obtaining a
//! handle, resolving and checking out a branch, pulling, and reading commit
//! metadata.

mod branch;
mod checkout;
mod metadata;
mod pull;
mod repo;
mod repo_url;
mod transport;

pub use branch::{local_branch_ref, remote_branch_ref, ResolvedBranch};
pub use metadata::{CommitMetadata, SHORT_HASH_LEN};
pub use pull::{PullOptions, UpdateOutcome, DEFAULT_REMOTE};
pub use repo::{GitRepo, HandleOrigin};
pub use repo_url::{default_repos_cache_dir, RepoUrl};
pub use transport::TransportOptions;
