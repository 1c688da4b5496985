//! Read-only commit metadata for a working copy

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::Serialize;

use super::repo::GitRepo;
use crate::{Error, Result};

/// Number of hex characters in a short hash
pub const SHORT_HASH_LEN: usize = 8;

/// Identity and age of the current commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMetadata {
    /// First eight hex characters of the HEAD commit id
    pub short_hash: String,
    /// Committer time of the most recent commit
    pub committed_at: DateTime<FixedOffset>,
}

impl GitRepo {
    /// Short identifier of the commit HEAD resolves to
    ///
    /// Only meant for display and change detection within one repository;
    /// eight characters are not guaranteed to be unique.
    pub fn short_hash(&self) -> Result<String> {
        let head = self.inner().head().map_err(Error::Head)?;
        let oid = head
            .target()
            .ok_or_else(|| Error::Head(git2::Error::from_str("HEAD has no target")))?;

        let mut hash = oid.to_string();
        hash.truncate(SHORT_HASH_LEN);
        Ok(hash)
    }

    /// Committer timestamp of the most recent commit reachable from HEAD
    pub fn latest_commit_timestamp(&self) -> Result<DateTime<FixedOffset>> {
        let repo = self.inner();
        let mut walk = repo.revwalk().map_err(Error::Log)?;
        walk.push_head().map_err(Error::Log)?;

        let oid = walk
            .next()
            .ok_or_else(|| Error::Log(git2::Error::from_str("no commits in history")))?
            .map_err(Error::Log)?;
        let commit = repo.find_commit(oid).map_err(Error::Log)?;

        let when = commit.committer().when();
        to_datetime(when)
    }

    /// Short hash and latest commit time together
    pub fn commit_metadata(&self) -> Result<CommitMetadata> {
        Ok(CommitMetadata {
            short_hash: self.short_hash()?,
            committed_at: self.latest_commit_timestamp()?,
        })
    }
}

fn to_datetime(time: git2::Time) -> Result<DateTime<FixedOffset>> {
    let invalid = || Error::Log(git2::Error::from_str("commit time out of range"));

    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).ok_or_else(invalid)?;
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::TransportOptions;
    use crate::testing::{commit_file, init_upstream, url_of};
    use git2::{Repository, RepositoryInitOptions};
    use tempfile::TempDir;

    #[test]
    fn test_short_hash_is_prefix_of_head() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        let tip = commit_file(&upstream, "main", "README", "hello", 1_700_000_000);
        let repo = GitRepo::clone_remote(
            &temp.path().join("work"),
            &url_of(&upstream),
            None,
            &TransportOptions::default(),
        )
        .unwrap();

        let hash = repo.short_hash().unwrap();
        assert_eq!(hash.len(), SHORT_HASH_LEN);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(tip.to_string().starts_with(&hash));
    }

    #[test]
    fn test_latest_timestamp() {
        let temp = TempDir::new().unwrap();
        let upstream = init_upstream(temp.path());
        commit_file(&upstream, "main", "README", "one", 1_700_000_000);
        commit_file(&upstream, "main", "README", "two", 1_700_003_600);
        let repo = GitRepo::clone_remote(
            &temp.path().join("work"),
            &url_of(&upstream),
            None,
            &TransportOptions::default(),
        )
        .unwrap();

        let stamp = repo.latest_commit_timestamp().unwrap();
        assert_eq!(stamp.timestamp(), 1_700_003_600);

        let meta = repo.commit_metadata().unwrap();
        assert_eq!(meta.committed_at, stamp);
        assert_eq!(meta.short_hash, repo.short_hash().unwrap());
    }

    #[test]
    fn test_empty_repository_errors() {
        let temp = TempDir::new().unwrap();
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        Repository::init_opts(temp.path().join("empty"), &opts).unwrap();
        let repo = GitRepo::open(temp.path().join("empty")).unwrap();

        assert!(matches!(repo.short_hash(), Err(Error::Head(_))));
        assert!(matches!(repo.latest_commit_timestamp(), Err(Error::Log(_))));
    }

    #[test]
    fn test_offset_is_preserved() {
        let stamp = to_datetime(git2::Time::new(1_700_000_000, 120)).unwrap();
        assert_eq!(stamp.offset().local_minus_utc(), 7200);
        assert_eq!(stamp.timestamp(), 1_700_000_000);
    }
}
