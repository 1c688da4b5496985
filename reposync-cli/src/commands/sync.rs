//! Sync command - clone or update one or all configured repositories

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use reposync_core::{
    synchronize, CommitMetadata, Config, RepositoryConfig, Secrets, SyncOutcome, TransportOptions,
};

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Remote URL or owner/repo shorthand
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub url: Option<String>,

    /// Local directory (defaults to <cache-dir>/<owner>/<repo>)
    #[arg(short = 'd', long)]
    pub dir: Option<PathBuf>,

    /// Branch to pin the working copy to
    #[arg(short = 'r', long)]
    pub revision: Option<String>,

    /// Sync every repository listed in the config file
    #[arg(long)]
    pub all: bool,

    /// Deadline per repository in seconds (overrides config)
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

/// What happened to one repository
#[derive(Debug)]
enum Attempt {
    Done {
        outcome: SyncOutcome,
        metadata: Option<CommitMetadata>,
    },
    Failed(reposync_core::Error),
    TimedOut,
    Crashed(tokio::task::JoinError),
}

/// Tally of one sync run over several repositories
#[derive(Debug, Default, PartialEq, Eq)]
struct SyncReport {
    total: usize,
    failed: usize,
    timed_out: bool,
}

impl SyncArgs {
    /// Deadline override from the command line
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Execute the sync command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let cache_dir = config.cache_dir()?;
        let token = Secrets::load()?.token();
        let transport = config.transport_options(token);

        let entries = if self.all {
            config.repositories.clone()
        } else {
            vec![RepositoryConfig {
                url: self.url.clone().unwrap_or_default(),
                directory: self.dir.clone(),
                revision: self.revision.clone(),
            }]
        };

        if entries.is_empty() {
            println!("No repositories configured.");
            return Ok(());
        }

        let report = sync_entries(
            &entries,
            &cache_dir,
            &transport,
            config.sync.timeout,
            verbose,
        )
        .await;

        if report.timed_out {
            // Abandoned blocking threads cannot be cancelled and would hold up runtime shutdown
            eprintln!(
                "{} of {} repositories failed to sync",
                report.failed, report.total
            );
            std::process::exit(1);
        }
        if report.failed > 0 {
            anyhow::bail!(
                "{} of {} repositories failed to sync",
                report.failed,
                report.total
            );
        }

        Ok(())
    }
}

/// Sync each entry in turn, logging and skipping the ones that fail
async fn sync_entries(
    entries: &[RepositoryConfig],
    cache_dir: &Path,
    transport: &TransportOptions,
    timeout: Duration,
    verbose: bool,
) -> SyncReport {
    let mut report = SyncReport {
        total: entries.len(),
        ..SyncReport::default()
    };

    // One repository at a time: cycles on the same copy must never overlap
    for entry in entries {
        let request = match entry.to_request(cache_dir) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(url = %entry.url, "skipping repository: {}", e);
                report.failed += 1;
                continue;
            }
        };

        if verbose {
            tracing::info!(
                url = %request.remote_url(),
                directory = %request.directory().display(),
                revision = ?request.revision(),
                "Starting sync"
            );
        }

        let label = request.directory().display().to_string();
        let transport = transport.clone();
        let attempt = run_with_deadline(timeout, move || {
            let synced = synchronize(&request, &transport)?;
            let metadata = synced.repo.commit_metadata().ok();
            Ok((synced.outcome, metadata))
        })
        .await;

        match attempt {
            Attempt::Done { outcome, metadata } => match metadata {
                Some(meta) => println!(
                    "{}: {} at {} ({})",
                    label,
                    outcome,
                    meta.short_hash,
                    meta.committed_at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
                ),
                None => println!("{}: {}", label, outcome),
            },
            Attempt::Failed(e) => {
                tracing::warn!(directory = %label, kind = ?e.kind(), "sync failed: {}", e);
                report.failed += 1;
            }
            Attempt::TimedOut => {
                tracing::warn!(
                    directory = %label,
                    timeout = ?timeout,
                    "sync timed out, abandoning it"
                );
                report.failed += 1;
                report.timed_out = true;
            }
            Attempt::Crashed(e) => {
                tracing::warn!(directory = %label, "sync task crashed: {}", e);
                report.failed += 1;
            }
        }
    }

    report
}

/// Run one blocking sync cycle on its own thread, bounded by `timeout`
async fn run_with_deadline<F>(timeout: Duration, cycle: F) -> Attempt
where
    F: FnOnce() -> reposync_core::Result<(SyncOutcome, Option<CommitMetadata>)> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(cycle);

    match tokio::time::timeout(timeout, task).await {
        Err(_) => Attempt::TimedOut,
        Ok(Err(e)) => Attempt::Crashed(e),
        Ok(Ok(Err(e))) => Attempt::Failed(e),
        Ok(Ok(Ok((outcome, metadata)))) => Attempt::Done { outcome, metadata },
    }
}
