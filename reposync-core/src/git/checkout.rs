//! Switching the working tree to a local branch

use git2::build::CheckoutBuilder;
use tracing::debug;

use super::repo::GitRepo;
use crate::{Error, Result};

impl GitRepo {
    /// Check out the local branch `reference` and point HEAD at it
    ///
    /// Uses a safe checkout: files with local modifications that the switch
    /// would overwrite abort the operation instead of being clobbered.
    /// `revision` is only used to label errors.
    pub fn checkout_branch(&self, reference: &str, revision: &str) -> Result<()> {
        let wrap = |source: git2::Error| Error::Checkout {
            revision: revision.to_string(),
            source,
        };

        if !reference.starts_with("refs/heads/") {
            return Err(wrap(git2::Error::from_str(&format!(
                "{} is not a local branch",
                reference
            ))));
        }

        let repo = self.inner();
        let commit = repo
            .find_reference(reference)
            .and_then(|r| r.peel_to_commit())
            .map_err(wrap)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        repo.checkout_tree(commit.as_object(), Some(&mut checkout))
            .map_err(wrap)?;
        repo.set_head(reference).map_err(wrap)?;

        debug!(branch = %reference, commit = %commit.id(), "checked out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::TransportOptions;
    use crate::testing::{commit_file, init_upstream, url_of};
    use tempfile::TempDir;

    fn cloned(temp: &TempDir) -> GitRepo {
        let upstream = init_upstream(temp.path());
        commit_file(&upstream, "main", "README", "main", 1_700_000_000);
        commit_file(&upstream, "release", "README", "release", 1_700_000_100);
        GitRepo::clone_remote(
            &temp.path().join("work"),
            &url_of(&upstream),
            None,
            &TransportOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_checkout_resolved_branch() {
        let temp = TempDir::new().unwrap();
        let repo = cloned(&temp);
        let resolved = repo.resolve_branch("release", "origin").unwrap();

        repo.checkout_branch(&resolved.reference, "release").unwrap();

        assert_eq!(repo.current_branch().unwrap(), Some("release".to_string()));
        let contents = std::fs::read_to_string(repo.root().join("README")).unwrap();
        assert_eq!(contents, "release");
    }

    #[test]
    fn test_local_modifications_abort_checkout() {
        let temp = TempDir::new().unwrap();
        let repo = cloned(&temp);
        let resolved = repo.resolve_branch("release", "origin").unwrap();
        std::fs::write(repo.root().join("README"), "edited locally").unwrap();

        let err = repo
            .checkout_branch(&resolved.reference, "release")
            .unwrap_err();
        assert!(matches!(err, Error::Checkout { ref revision, .. } if revision == "release"));
        assert_eq!(repo.current_branch().unwrap(), Some("main".to_string()));
    }

    #[test]
    fn test_unresolvable_reference() {
        let temp = TempDir::new().unwrap();
        let repo = cloned(&temp);

        let err = repo
            .checkout_branch("refs/heads/missing", "missing")
            .unwrap_err();
        assert!(err.to_string().ends_with("missing"));
    }

    #[test]
    fn test_rejects_non_branch_reference() {
        let temp = TempDir::new().unwrap();
        let repo = cloned(&temp);

        let err = repo
            .checkout_branch("refs/remotes/origin/release", "release")
            .unwrap_err();
        assert!(matches!(err, Error::Checkout { .. }));
    }
}
