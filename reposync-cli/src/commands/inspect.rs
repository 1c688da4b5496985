//! Read-only commands reporting on an existing working copy

use std::path::PathBuf;

use chrono::SecondsFormat;
use clap::Args;
use reposync_core::GitRepo;

/// Arguments shared by head, stamp and status
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Working copy directory
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectArgs {
    fn open(&self) -> anyhow::Result<GitRepo> {
        Ok(GitRepo::open(&self.dir)?)
    }

    /// Print the short hash of HEAD
    pub fn head(&self) -> anyhow::Result<()> {
        let hash = self.open()?.short_hash()?;
        if self.json {
            println!("{}", serde_json::json!({ "short_hash": hash }));
        } else {
            println!("{}", hash);
        }
        Ok(())
    }

    /// Print the latest commit timestamp
    pub fn stamp(&self) -> anyhow::Result<()> {
        let stamp = self.open()?.latest_commit_timestamp()?;
        if self.json {
            println!("{}", serde_json::json!({ "committed_at": stamp }));
        } else {
            println!("{}", stamp.to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        Ok(())
    }

    /// Print branch, short hash and latest commit time
    pub fn status(&self) -> anyhow::Result<()> {
        let repo = self.open()?;
        let branch = repo.current_branch()?;
        let metadata = repo.commit_metadata()?;

        if self.json {
            let mut value = serde_json::to_value(&metadata)?;
            value["directory"] = serde_json::json!(repo.root().display().to_string());
            value["branch"] = serde_json::json!(branch);
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("Directory: {}", repo.root().display());
        println!("Branch:    {}", branch.as_deref().unwrap_or("(detached)"));
        if let Some((remote, merge)) = branch
            .as_deref()
            .map(|b| repo.branch_upstream(b))
            .transpose()?
            .flatten()
        {
            println!("Upstream:  {} {}", remote, merge);
        }
        println!("Commit:    {}", metadata.short_hash);
        println!(
            "Committed: {}",
            metadata
                .committed_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        Ok(())
    }
}
