//! Reposync Core - keep local git working copies in sync with their upstream
//!
//! A sync cycle clones a remote on first sight and afterwards reopens the
//! local copy, optionally pins it to a branch, and fast-forwards it. The
//! "already cloned" and "already up to date" cases are ordinary outcomes,
//! not errors, so callers can run cycles repeatedly.

pub mod config;
pub mod error;
pub mod git;
pub mod secrets;
pub mod sync;

#[cfg(test)]
mod testing;

pub use config::{Config, RepositoryConfig};
pub use error::{Error, ErrorKind, Result};
pub use git::{
    CommitMetadata, GitRepo, HandleOrigin, PullOptions, RepoUrl, ResolvedBranch,
    TransportOptions, UpdateOutcome,
};
pub use secrets::Secrets;
pub use sync::{synchronize, SyncOptions, SyncOutcome, SyncRequest, Synced};
