//! Integration tests for the run driver.
//!
//! These tests verify that:
//! - Each family file yields a team and an approvers team
//! - Org admins are looked up once per run, whatever the number of teams
//! - A failing team is reported without stopping the others
//! - Dry runs never change a roster
//! - A full run against a mocked GitHub API issues the expected requests

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use rostersync::rostersync_core::{GroupRef, Identity, Membership, Role, Settings, load_target_dir};
use rostersync::rostersync_reconciler::{InMemoryDirectory, RecordingReporter, Syncer};
use rostersync::{Cli, DRY_RUN_BANNER, TeamNaming, derive_targets, driver};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_families(dir: &Path) -> std::io::Result<()> {
    std::fs::write(dir.join("go.yaml"), "alice: maintainer\nbob: member\n")?;
    std::fs::write(dir.join("java.yaml"), "carol: member\n")?;
    std::fs::write(dir.join("README.md"), "not a target file\n")
}

fn team(name: &str) -> GroupRef {
    GroupRef::new("abcxyz", name)
}

fn roster(entries: &[(&str, Role)]) -> Membership {
    entries
        .iter()
        .map(|(handle, role)| (Identity::from(*handle), *role))
        .collect()
}

struct Fixture {
    directory: Arc<InMemoryDirectory>,
    reporter: Arc<RecordingReporter>,
    syncer: Syncer,
    families: BTreeMap<String, Membership>,
    _dir: tempfile::TempDir,
}

async fn fixture(dry_run: bool) -> Result<Fixture, Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    write_families(dir.path())?;
    let families = load_target_dir(dir.path())?;

    let directory = InMemoryDirectory::new_arc();
    directory
        .set_org_admins("abcxyz", [Identity::from("dave"), Identity::from("googlebot")])
        .await;

    let reporter = Arc::new(RecordingReporter::new());
    let syncer = Syncer::builder()
        .with_directory(directory.clone())
        .with_reporter(reporter.clone())
        .with_ignore_list(Settings::default().ignore_list())
        .dry_run(dry_run)
        .build()?;

    Ok(Fixture {
        directory,
        reporter,
        syncer,
        families,
        _dir: dir,
    })
}

/// # GIVEN
/// Two family files and empty teams
///
/// # WHEN
/// The run syncs both families two at a time
///
/// # THEN
/// All four teams match their targets and admins were listed once
#[tokio::test]
async fn test_run_syncs_team_and_approvers_for_every_family() -> TestResult {
    let fx = fixture(false).await?;
    let targets = derive_targets(
        "abcxyz",
        &fx.families,
        &TeamNaming::from(&Settings::default()),
    );

    let summary = driver::run(&fx.syncer, fx.reporter.as_ref(), targets, 2).await?;

    assert_eq!(summary.reports.len(), 4);
    assert_eq!(
        fx.directory.team(&team("go-readability")).await,
        roster(&[("alice", Role::Maintainer), ("bob", Role::Member)])
    );
    assert_eq!(
        fx.directory.team(&team("go-readability-approvers")).await,
        roster(&[("alice", Role::Maintainer)])
    );
    assert_eq!(
        fx.directory.team(&team("java-readability")).await,
        roster(&[("carol", Role::Member)])
    );
    assert!(fx.directory.team(&team("java-readability-approvers")).await.is_empty());
    assert_eq!(fx.directory.admin_lookups("abcxyz").await, 1);

    let lines = fx.reporter.lines();
    assert!(lines.iter().any(|line| line == "🔄 Synchronizing go..."));
    assert!(lines.iter().any(|line| line == "🔄 Synchronizing java..."));
    Ok(())
}

/// # GIVEN
/// The go team cannot be listed
///
/// # WHEN
/// The run syncs every family
///
/// # THEN
/// The go failure is reported and every other team is still synced
#[tokio::test]
async fn test_run_continues_past_failed_team() -> TestResult {
    let fx = fixture(false).await?;
    fx.directory.fail_listing(&team("go-readability")).await;
    let targets = derive_targets(
        "abcxyz",
        &fx.families,
        &TeamNaming::from(&Settings::default()),
    );

    let outcome = driver::run(&fx.syncer, fx.reporter.as_ref(), targets, 1).await;

    let Err(error) = outcome else {
        return Err("run should report the failing team".into());
    };
    assert_eq!(error.failures.len(), 1);
    assert!(
        error
            .failures
            .iter()
            .all(|failure| failure.family == "go" && failure.error.is_fatal_to_group())
    );
    assert_eq!(error.summary.reports.len(), 3);
    assert_eq!(
        fx.directory.team(&team("java-readability")).await,
        roster(&[("carol", Role::Member)])
    );
    assert!(error.to_string().contains("abcxyz/go-readability"));
    Ok(())
}

/// # GIVEN
/// A dry-run syncer
///
/// # WHEN
/// The run syncs every family
///
/// # THEN
/// Changes are reported but no roster is touched
#[tokio::test]
async fn test_dry_run_changes_nothing() -> TestResult {
    let fx = fixture(true).await?;
    let targets = derive_targets(
        "abcxyz",
        &fx.families,
        &TeamNaming::from(&Settings::default()),
    );

    let summary = driver::run(&fx.syncer, fx.reporter.as_ref(), targets, 1).await?;

    assert!(fx.directory.mutations().await.is_empty());
    assert!(summary.reports.iter().all(|report| report.dry_run));
    assert_eq!(summary.changes(), 4);
    assert!(
        fx.reporter
            .lines()
            .iter()
            .any(|line| line == "✅ adding alice to abcxyz/go-readability as maintainer")
    );
    Ok(())
}

async fn mount_listing(server: &MockServer, url_path: &str, role: &str, logins: &[&str]) {
    let body: Vec<serde_json::Value> = logins
        .iter()
        .map(|login| serde_json::json!({ "login": login }))
        .collect();
    Mock::given(method("GET"))
        .and(path(url_path))
        .and(query_param("role", role))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mock_github(server: &MockServer, writes_expected: u64) {
    mount_listing(server, "/orgs/abcxyz/members", "admin", &[]).await;
    mount_listing(
        server,
        "/orgs/abcxyz/teams/go-readability/members",
        "member",
        &["bob", "carol"],
    )
    .await;
    mount_listing(server, "/orgs/abcxyz/teams/go-readability/members", "maintainer", &[]).await;
    for role in ["member", "maintainer"] {
        mount_listing(
            server,
            "/orgs/abcxyz/teams/go-readability-approvers/members",
            role,
            &[],
        )
        .await;
    }

    Mock::given(method("PUT"))
        .and(path("/orgs/abcxyz/teams/go-readability/memberships/alice"))
        .and(body_json(serde_json::json!({ "role": "maintainer" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(writes_expected)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/orgs/abcxyz/teams/go-readability/memberships/carol"))
        .respond_with(ResponseTemplate::new(204))
        .expect(writes_expected)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/orgs/abcxyz/teams/go-readability-approvers/memberships/alice"))
        .and(body_json(serde_json::json!({ "role": "maintainer" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(writes_expected)
        .mount(server)
        .await;
}

fn cli_for(dir: &Path, server: &MockServer, dry_run: bool) -> Result<Cli, clap::Error> {
    let config_dir = dir.to_string_lossy().into_owned();
    let api_url = server.uri();
    let mut args = vec![
        "rostersync",
        "--config-dir",
        config_dir.as_str(),
        "--api-url",
        api_url.as_str(),
        "--github-token",
        "test-token",
    ];
    if dry_run {
        args.push("--dry-run");
    }
    let matches = Cli::command()
        .mut_args(|arg| arg.env(None::<&'static str>))
        .try_get_matches_from(args)?;
    Cli::from_arg_matches(&matches)
}

/// # GIVEN
/// A go family and a GitHub team with one extra member
///
/// # WHEN
/// The binary's run executes against the mocked API
///
/// # THEN
/// alice is added to both teams as maintainer and carol is removed
#[tokio::test]
async fn test_execute_against_github_api() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("go.yaml"), "alice: maintainer\nbob: member\n")?;
    let server = MockServer::start().await;
    mock_github(&server, 1).await;

    let reporter = Arc::new(RecordingReporter::new());
    let cli = cli_for(dir.path(), &server, false)?;
    let summary = rostersync::execute_with_reporter(&cli, reporter.clone()).await?;

    assert_eq!(summary.changes(), 3);
    assert_eq!(
        reporter.lines().first().map(String::as_str),
        Some("🔄 Synchronizing go...")
    );
    Ok(())
}

/// # GIVEN
/// The same setup in dry-run mode
///
/// # WHEN
/// The run executes
///
/// # THEN
/// The banner comes first and no write request reaches the API
#[tokio::test]
async fn test_execute_dry_run_sends_no_writes() -> TestResult {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("go.yaml"), "alice: maintainer\nbob: member\n")?;
    let server = MockServer::start().await;
    mock_github(&server, 0).await;

    let reporter = Arc::new(RecordingReporter::new());
    let cli = cli_for(dir.path(), &server, true)?;
    let summary = rostersync::execute_with_reporter(&cli, reporter.clone()).await?;

    assert_eq!(summary.changes(), 3);
    assert_eq!(
        reporter.lines().first().map(String::as_str),
        Some(DRY_RUN_BANNER)
    );
    Ok(())
}
