//! Wires the CLI, settings, GitHub client and syncer into one run.

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use rostersync_core::{Settings, load_target_dir};
use rostersync_reconciler::{ConsoleReporter, ProgressReporter, Syncer};
use tracing::{info, warn};

use crate::cli::Cli;
use crate::driver::{self, RunSummary, TeamNaming, derive_targets};
use crate::github::{GitHubConfig, GitHubDirectory};

/// Exit status when a termination signal stops the run.
pub const INTERRUPTED_EXIT_STATUS: u8 = 130;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// Every team synchronized.
    Succeeded,
    /// Configuration failed or at least one team failed; the rendered error chain.
    Failed(String),
    /// A signal arrived first; in-flight calls were dropped.
    Interrupted(&'static str),
}

impl Termination {
    /// Process exit status: 0, 1 or 130.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Succeeded => ExitCode::SUCCESS,
            Self::Failed(_) => ExitCode::FAILURE,
            Self::Interrupted(_) => ExitCode::from(INTERRUPTED_EXIT_STATUS),
        }
    }
}

/// Drive `run` to completion unless `shutdown` resolves first.
///
/// `shutdown` yields the name of the signal received. Dropping `run` cancels
/// every outstanding directory call; changes already sent stay applied.
pub async fn run_until_shutdown<R, S>(run: R, shutdown: S) -> Termination
where
    R: Future<Output = Result<RunSummary>>,
    S: Future<Output = &'static str>,
{
    tokio::select! {
        outcome = run => match outcome {
            Ok(_) => Termination::Succeeded,
            Err(err) => Termination::Failed(format!("{err:#}")),
        },
        signal = shutdown => {
            warn!(signal, "interrupted, abandoning the run");
            Termination::Interrupted(signal)
        }
    }
}

/// Printed before any team is touched in dry-run mode.
pub const DRY_RUN_BANNER: &str = "⚠️ Operating in dry-run mode, changes will not be applied";

/// Resolve settings from the optional settings file and CLI overrides.
///
/// # Errors
///
/// Returns an error if the settings file cannot be loaded or the result is invalid.
pub fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let Some(org) = &cli.org else {
        return Ok(settings);
    };
    Settings {
        org: org.clone(),
        ..settings
    }
    .validate()
    .context("invalid settings")
}

/// Run one synchronization with the console reporter.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, or if any team failed
/// to synchronize.
pub async fn execute(cli: &Cli) -> Result<RunSummary> {
    execute_with_reporter(cli, Arc::new(ConsoleReporter)).await
}

/// Run one synchronization, sending progress lines to `reporter`.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, or if any team failed
/// to synchronize.
pub async fn execute_with_reporter(
    cli: &Cli,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<RunSummary> {
    let settings = resolve_settings(cli)?;
    let families = load_target_dir(&cli.config_dir).with_context(|| {
        format!(
            "failed to load target memberships from {}",
            cli.config_dir.display()
        )
    })?;

    if cli.github_token.as_deref().is_none_or(str::is_empty) {
        warn!("no GitHub token configured, requests are unauthenticated");
    }
    let config = GitHubConfig::new(cli.api_url.clone()).with_token(cli.github_token.clone());
    let directory = GitHubDirectory::new(config).context("failed to create GitHub client")?;

    let syncer = Syncer::builder()
        .with_directory(Arc::new(directory))
        .with_reporter(Arc::clone(&reporter))
        .with_ignore_list(settings.ignore_list())
        .dry_run(cli.dry_run)
        .max_concurrent_operations(settings.max_concurrent_operations)
        .build()
        .context("failed to create syncer")?;

    if cli.dry_run {
        reporter.message(DRY_RUN_BANNER);
    }

    info!(
        org = %settings.org,
        families = families.len(),
        dry_run = cli.dry_run,
        "starting synchronization"
    );
    let targets = derive_targets(&settings.org, &families, &TeamNaming::from(&settings));
    let summary = driver::run(
        &syncer,
        reporter.as_ref(),
        targets,
        cli.max_concurrent_groups,
    )
    .await?;
    Ok(summary)
}
