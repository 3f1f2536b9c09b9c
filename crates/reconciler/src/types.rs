//! Core types for the reconciler.

use rostersync_core::{GroupRef, Identity, Membership, OrgAdminSet, Role};
use serde::{Deserialize, Serialize};

/// A single membership change for one team.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MembershipOp {
    /// Add an identity that is not in the team yet.
    Add { identity: Identity, role: Role },
    /// Change the role of an identity already in the team.
    Update {
        identity: Identity,
        from: Role,
        to: Role,
    },
    /// Remove an identity that is no longer declared.
    Remove { identity: Identity, role: Role },
}

impl MembershipOp {
    /// Identity this operation targets.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        match self {
            Self::Add { identity, .. }
            | Self::Update { identity, .. }
            | Self::Remove { identity, .. } => identity,
        }
    }

    /// Role the identity holds once the operation is applied, `None` for removals.
    #[must_use]
    pub const fn target_role(&self) -> Option<Role> {
        match self {
            Self::Add { role, .. } => Some(*role),
            Self::Update { to, .. } => Some(*to),
            Self::Remove { .. } => None,
        }
    }

    /// Short verb phrase, e.g. `add alice as member`.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Add { identity, role } => format!("add {identity} as {role}"),
            Self::Update { identity, from, to } => {
                format!("update {identity} from {from} to {to}")
            }
            Self::Remove { identity, .. } => format!("remove {identity}"),
        }
    }

    /// Operator-facing progress line for this operation in `group`.
    #[must_use]
    pub fn progress_line(&self, group: &GroupRef) -> String {
        match self {
            Self::Add { identity, role } => {
                format!("✅ adding {identity} to {group} as {role}")
            }
            Self::Update { identity, from, to } => {
                format!("♻️ updating {identity} role in {group} from {from} to {to}")
            }
            Self::Remove { identity, .. } => format!("❌ removing {identity} from {group}"),
        }
    }
}

/// Org admin whose requested role was raised to maintainer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOverride {
    /// The admin.
    pub identity: Identity,
    /// Role declared in the target file.
    pub requested: Role,
}

/// Operations needed to converge one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Adds and updates in identity order, followed by removals in identity order.
    pub operations: Vec<MembershipOp>,
    /// Target entries that were upgraded because the identity is an org admin.
    pub overrides: Vec<AdminOverride>,
}

impl SyncPlan {
    /// Whether the team already matches the target.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Compute the operations that turn `existing` into `target`.
///
/// Org admins are always targeted as maintainers. Removals are decided on
/// target keys only, roles play no part in them.
#[must_use]
pub fn plan(existing: &Membership, target: &Membership, admins: &OrgAdminSet) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for (identity, requested) in target.iter() {
        let role = if admins.contains(identity.as_str()) && requested != Role::Maintainer {
            plan.overrides.push(AdminOverride {
                identity: identity.clone(),
                requested,
            });
            Role::Maintainer
        } else {
            requested
        };

        match existing.get(identity.as_str()) {
            None => plan.operations.push(MembershipOp::Add {
                identity: identity.clone(),
                role,
            }),
            Some(current) if current != role => plan.operations.push(MembershipOp::Update {
                identity: identity.clone(),
                from: current,
                to: role,
            }),
            Some(_) => {}
        }
    }

    plan.operations.extend(
        existing
            .iter()
            .filter(|(identity, _)| !target.contains(identity.as_str()))
            .map(|(identity, role)| MembershipOp::Remove {
                identity: identity.clone(),
                role,
            }),
    );

    plan
}

/// Outcome of a successful team sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// The team.
    pub group: GroupRef,
    /// Operations that were applied, or only reported in dry-run mode.
    pub operations: Vec<MembershipOp>,
    /// Admin overrides applied while planning.
    pub overrides: Vec<AdminOverride>,
    /// Whether mutations were suppressed.
    pub dry_run: bool,
    /// Whether the team already matched the target.
    pub converged: bool,
}

impl SyncReport {
    /// Create a report from a plan.
    #[must_use]
    pub fn new(group: GroupRef, plan: SyncPlan, dry_run: bool) -> Self {
        let converged = plan.is_converged();
        Self {
            group,
            operations: plan.operations,
            overrides: plan.overrides,
            dry_run,
            converged,
        }
    }

    /// Number of additions.
    #[must_use]
    pub fn added(&self) -> usize {
        self.count(|op| matches!(op, MembershipOp::Add { .. }))
    }

    /// Number of role updates.
    #[must_use]
    pub fn updated(&self) -> usize {
        self.count(|op| matches!(op, MembershipOp::Update { .. }))
    }

    /// Number of removals.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.count(|op| matches!(op, MembershipOp::Remove { .. }))
    }

    fn count(&self, predicate: impl Fn(&MembershipOp) -> bool) -> usize {
        self.operations.iter().filter(|op| predicate(op)).count()
    }
}
