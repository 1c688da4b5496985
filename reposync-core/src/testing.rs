//! Helpers for fabricating upstream repositories in tests

use std::path::Path;

use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};

/// Create a bare upstream repository whose HEAD points at `main`
pub fn init_upstream(base: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    Repository::init_opts(base.join("upstream.git"), &opts).unwrap()
}

/// Clone URL for a local upstream
pub fn url_of(repo: &Repository) -> String {
    repo.path().to_str().unwrap().to_string()
}

/// Commit `path = contents` on top of `branch` without touching any working tree
pub fn commit_file(repo: &Repository, branch: &str, path: &str, contents: &str, time: i64) -> Oid {
    let refname = format!("refs/heads/{}", branch);
    let parent = repo
        .refname_to_id(&refname)
        .ok()
        .map(|oid| repo.find_commit(oid).unwrap());
    let parent_tree = parent.as_ref().map(|c| c.tree().unwrap());

    let blob = repo.blob(contents.as_bytes()).unwrap();
    let mut builder = repo.treebuilder(parent_tree.as_ref()).unwrap();
    builder.insert(path, blob, 0o100644).unwrap();
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();

    let sig = Signature::new("Test", "test@example.com", &Time::new(time, 0)).unwrap();
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(
        Some(&refname),
        &sig,
        &sig,
        &format!("update {}", path),
        &tree,
        &parents,
    )
    .unwrap()
}
