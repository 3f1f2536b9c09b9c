//! Property-based tests for team reconciliation using proptest.
//!
//! Properties verified:
//! - Convergence: a successful sync leaves the team equal to the target, with
//!   org admins held as maintainers
//! - Idempotence: a second sync issues no mutations
//! - Removal correctness: every undeclared identity is removed exactly once
//! - Dry-run: no mutation reaches the directory

use std::future::Future;
use std::sync::Arc;

use proptest::prelude::*;
use rostersync_core::{GroupRef, IgnoreList, Identity, Membership, Role};
use rostersync_reconciler::{DirectoryCall, InMemoryDirectory, RecordingReporter, Syncer};

const POOL: [&str; 6] = ["alice", "bob", "carol", "dave", "erin", "frank"];

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Member), Just(Role::Maintainer)]
}

fn membership_strategy() -> impl Strategy<Value = Membership> {
    prop::collection::btree_map(prop::sample::select(POOL.to_vec()), role_strategy(), 0..4)
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(handle, role)| (Identity::from(handle), role))
                .collect()
        })
}

fn admins_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(POOL.to_vec(), 0..=2)
}

fn team() -> GroupRef {
    GroupRef::new("abcxyz", "go-readability")
}

/// Run a future on a fresh runtime, mapping runtime creation errors into test failures.
fn block_on<T>(future: impl Future<Output = T>) -> Result<T, TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(format!("runtime creation failed: {e}")))?;
    Ok(runtime.block_on(future))
}

async fn fixture(
    existing: &Membership,
    admins: &[&str],
    dry_run: bool,
) -> rostersync_reconciler::Result<(Arc<InMemoryDirectory>, Syncer)> {
    let directory = InMemoryDirectory::new_arc();
    directory.set_team(&team(), existing).await;
    directory
        .set_org_admins("abcxyz", admins.iter().copied().map(Identity::from))
        .await;

    let syncer = Syncer::builder()
        .with_directory(directory.clone())
        .with_reporter(Arc::new(RecordingReporter::new()))
        .with_ignore_list(IgnoreList::default())
        .dry_run(dry_run)
        .build()?;
    Ok((directory, syncer))
}

fn expected_roster(target: &Membership, admins: &[&str]) -> Membership {
    target
        .iter()
        .map(|(identity, role)| {
            let is_admin = admins.iter().any(|admin| *admin == identity.as_str());
            let role = if is_admin { Role::Maintainer } else { role };
            (identity.clone(), role)
        })
        .collect()
}

proptest! {
    /// Property: one sync converges the team and a second one changes nothing.
    #[test]
    fn prop_sync_converges_and_is_idempotent(
        existing in membership_strategy(),
        target in membership_strategy(),
        admins in admins_strategy(),
    ) {
        let outcome = block_on(async {
            let (directory, syncer) = fixture(&existing, &admins, false).await?;
            syncer.sync(&team(), &target).await?;
            let first = directory.mutations().await;
            let second = syncer.sync(&team(), &target).await?;
            let after_second = directory.mutations().await;
            Ok::<_, rostersync_reconciler::Error>((
                directory.team(&team()).await,
                first,
                after_second,
                second.converged,
            ))
        })?;
        let (roster, first, after_second, converged) =
            outcome.map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert_eq!(roster, expected_roster(&target, &admins));
        prop_assert!(converged);
        prop_assert_eq!(after_second.len(), first.len());

        for identity in existing.identities().filter(|id| !target.contains(id.as_str())) {
            let removals = first
                .iter()
                .filter(|call| {
                    matches!(call, DirectoryCall::Remove { identity: removed, .. } if removed == identity)
                })
                .count();
            prop_assert_eq!(removals, 1);
        }
    }

    /// Property: dry-run never reaches the directory's write path.
    #[test]
    fn prop_dry_run_never_mutates(
        existing in membership_strategy(),
        target in membership_strategy(),
        admins in admins_strategy(),
    ) {
        let outcome = block_on(async {
            let (directory, syncer) = fixture(&existing, &admins, true).await?;
            let report = syncer.sync(&team(), &target).await?;
            Ok::<_, rostersync_reconciler::Error>((
                directory.mutations().await,
                directory.team(&team()).await,
                report.dry_run,
            ))
        })?;
        let (mutations, roster, dry_run) = outcome.map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert!(dry_run);
        prop_assert!(mutations.is_empty());
        prop_assert_eq!(roster, existing);
    }
}
