//! Error types for reposync

use thiserror::Error;

/// Result type alias for reposync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of a failure, used by callers to decide what to do
/// with a repository for the rest of a sync cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, transport or filesystem trouble; retrying later may succeed
    Transient,
    /// The repository is in a state the sync cannot reconcile on its own
    StateInconsistency,
    /// The request or configuration is wrong and will fail again unchanged
    Configuration,
}

/// Error type for reposync operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cloning the remote failed for a reason other than an existing destination
    #[error("plain clone: {0}")]
    Clone(#[source] git2::Error),

    /// Opening an existing local copy failed
    #[error("plain open: {0}")]
    Open(#[source] git2::Error),

    /// Creating the tracking branch for a revision failed
    #[error("repo create branch: {url}: {source}")]
    CreateBranch {
        url: String,
        #[source]
        source: git2::Error,
    },

    /// Switching the working tree to the resolved branch failed
    #[error("repo checkout: {source} {revision}")]
    Checkout {
        revision: String,
        #[source]
        source: git2::Error,
    },

    /// Fetching or fast-forwarding failed
    #[error("pull worktree: {0}")]
    Pull(#[source] git2::Error),

    /// Local and remote history diverged
    #[error("pull worktree: non-fast-forward update of {0}")]
    NonFastForward(String),

    /// HEAD could not be resolved
    #[error("get head: {0}")]
    Head(#[source] git2::Error),

    /// Commit history could not be read
    #[error("log repo: {0}")]
    Log(#[source] git2::Error),

    /// The sync request itself is malformed
    #[error("invalid sync request: {0}")]
    InvalidRequest(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) | Error::Clone(_) | Error::Open(_) | Error::Pull(_) => {
                ErrorKind::Transient
            }
            Error::CreateBranch { .. }
            | Error::Checkout { .. }
            | Error::NonFastForward(_)
            | Error::Head(_)
            | Error::Log(_) => ErrorKind::StateInconsistency,
            Error::InvalidRequest(_) | Error::Config(_) | Error::Other(_) => {
                ErrorKind::Configuration
            }
        }
    }

    /// Check if retrying on a later cycle might succeed without intervention
    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}
