//! Run driver: expands team families into teams and syncs them.
//!
//! Every family `go` declared in `go.yaml` owns two teams: `go-readability`
//! with the whole roster, and `go-readability-approvers` with only its
//! maintainers. A failing team never stops the run; its error is collected
//! with the family name and reported at the end.

use std::collections::BTreeMap;
use std::fmt;

use futures::stream::{self, StreamExt};
use itertools::Itertools;
use rostersync_core::{GroupRef, Membership, Role, Settings};
use rostersync_reconciler::{Error, ProgressReporter, SyncReport, Syncer};
use tracing::{info, warn};

/// How family names map onto team names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamNaming {
    /// Appended to the family for the full-roster team.
    pub team_suffix: String,
    /// Appended to the family for the maintainers-only team.
    pub approvers_suffix: String,
}

impl TeamNaming {
    /// Name of the full-roster team of `family`.
    #[must_use]
    pub fn team(&self, family: &str) -> String {
        format!("{family}{}", self.team_suffix)
    }

    /// Name of the approvers team of `family`.
    #[must_use]
    pub fn approvers(&self, family: &str) -> String {
        format!("{family}{}", self.approvers_suffix)
    }
}

impl From<&Settings> for TeamNaming {
    fn from(settings: &Settings) -> Self {
        Self {
            team_suffix: settings.team_suffix.clone(),
            approvers_suffix: settings.approvers_suffix.clone(),
        }
    }
}

/// The teams derived from one family file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyTargets {
    /// File stem of the family's target file.
    pub family: String,
    /// Each team with the membership it should end up with.
    pub teams: Vec<(GroupRef, Membership)>,
}

/// Expand families into their teams, in family name order.
#[must_use]
pub fn derive_targets(
    org: &str,
    families: &BTreeMap<String, Membership>,
    naming: &TeamNaming,
) -> Vec<FamilyTargets> {
    families
        .iter()
        .map(|(family, membership)| FamilyTargets {
            family: family.clone(),
            teams: vec![
                (GroupRef::new(org, naming.team(family)), membership.clone()),
                (
                    GroupRef::new(org, naming.approvers(family)),
                    membership.with_role(Role::Maintainer),
                ),
            ],
        })
        .collect()
}

/// A team that could not be synchronized.
#[derive(Debug)]
pub struct GroupFailure {
    /// Family the team was derived from.
    pub family: String,
    /// The team that failed.
    pub group: GroupRef,
    /// Why it failed.
    pub error: Error,
}

impl fmt::Display for GroupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to synchronize {} ({}): {}",
            self.family, self.group, self.error
        )
    }
}

/// Reports of every team that synchronized cleanly.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One report per successful team, in family order.
    pub reports: Vec<SyncReport>,
}

impl RunSummary {
    /// Number of changes planned across all teams.
    #[must_use]
    pub fn changes(&self) -> usize {
        self.reports.iter().map(|report| report.operations.len()).sum()
    }
}

/// At least one team failed. Successful reports are kept alongside.
#[derive(Debug, thiserror::Error)]
#[error("{}", render_failures(.failures))]
pub struct RunError {
    /// Every failed team, in family order.
    pub failures: Vec<GroupFailure>,
    /// Teams that did synchronize.
    pub summary: RunSummary,
}

fn render_failures(failures: &[GroupFailure]) -> String {
    failures.iter().join("\n")
}

type Outcome = (String, GroupRef, Result<SyncReport, Error>);

/// Synchronize every family, at most `max_concurrent_groups` families at once.
///
/// # Errors
///
/// Returns [`RunError`] listing every failed team once all families are done.
pub async fn run(
    syncer: &Syncer,
    reporter: &dyn ProgressReporter,
    targets: Vec<FamilyTargets>,
    max_concurrent_groups: usize,
) -> Result<RunSummary, RunError> {
    let outcomes: Vec<Vec<Outcome>> = stream::iter(targets)
        .map(|family| sync_family(syncer, reporter, family))
        .buffered(max_concurrent_groups.max(1))
        .collect()
        .await;

    let mut summary = RunSummary::default();
    let mut failures = Vec::new();
    for (family, group, outcome) in outcomes.into_iter().flatten() {
        match outcome {
            Ok(report) => summary.reports.push(report),
            Err(error) => {
                warn!(%family, %group, %error, "team synchronization failed");
                failures.push(GroupFailure {
                    family,
                    group,
                    error,
                });
            }
        }
    }

    info!(
        teams = summary.reports.len(),
        changes = summary.changes(),
        failed = failures.len(),
        "run finished"
    );

    if failures.is_empty() {
        Ok(summary)
    } else {
        Err(RunError { failures, summary })
    }
}

async fn sync_family(
    syncer: &Syncer,
    reporter: &dyn ProgressReporter,
    targets: FamilyTargets,
) -> Vec<Outcome> {
    reporter.message(&format!("🔄 Synchronizing {}...", targets.family));

    let mut outcomes = Vec::with_capacity(targets.teams.len());
    for (group, membership) in targets.teams {
        let outcome = syncer.sync(&group, &membership).await;
        outcomes.push((targets.family.clone(), group, outcome));
    }
    outcomes
}
