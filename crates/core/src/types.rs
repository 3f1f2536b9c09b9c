//! Domain types shared by every rostersync crate.

use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Opaque user handle as known by the directory (a GitHub login).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Create a new identity from a handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Identity {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(handle: &str) -> Self {
        Self::new(handle)
    }
}

impl From<String> for Identity {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

/// Permission level inside a team.
///
/// Variants are declared in ascending order so `Ord` gives the precedence
/// used when the directory reports the same identity under both roles.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular team member.
    Member,
    /// Team maintainer. Dominates `Member`.
    Maintainer,
}

impl Role {
    /// All roles, lowest first.
    pub const ALL: [Self; 2] = [Self::Member, Self::Maintainer];

    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Maintainer => "maintainer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "maintainer" => Ok(Self::Maintainer),
            other => Err(Error::invalid_role(other)),
        }
    }
}

/// Identity to role mapping for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Membership(BTreeMap<Identity, Role>);

impl Membership {
    /// Create an empty membership.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Merge per-role directory listings into one membership.
    ///
    /// An identity reported under several roles keeps the highest one.
    pub fn merge_listings(
        members: impl IntoIterator<Item = Identity>,
        maintainers: impl IntoIterator<Item = Identity>,
    ) -> Self {
        let mut merged = Self::new();
        let listed = members
            .into_iter()
            .map(|identity| (identity, Role::Member))
            .chain(
                maintainers
                    .into_iter()
                    .map(|identity| (identity, Role::Maintainer)),
            );
        for (identity, role) in listed {
            merged.promote(identity, role);
        }
        merged
    }

    /// Insert or replace the role for an identity, returning the previous role.
    pub fn insert(&mut self, identity: Identity, role: Role) -> Option<Role> {
        self.0.insert(identity, role)
    }

    /// Record `role` for `identity` unless a higher role is already present.
    pub fn promote(&mut self, identity: Identity, role: Role) {
        self.0
            .entry(identity)
            .and_modify(|current| *current = (*current).max(role))
            .or_insert(role);
    }

    /// Remove an identity, returning its role if present.
    pub fn remove(&mut self, identity: &str) -> Option<Role> {
        self.0.remove(identity)
    }

    /// Role held by an identity.
    #[must_use]
    pub fn get(&self, identity: &str) -> Option<Role> {
        self.0.get(identity).copied()
    }

    /// Whether an identity is present.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.0.contains_key(identity)
    }

    /// Number of identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the membership is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate identities and roles in identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&Identity, Role)> {
        self.0.iter().map(|(identity, role)| (identity, *role))
    }

    /// Iterate identities in order.
    pub fn identities(&self) -> impl Iterator<Item = &Identity> {
        self.0.keys()
    }

    /// Subset holding only the given role.
    #[must_use]
    pub fn with_role(&self, role: Role) -> Self {
        self.iter()
            .filter(|(_, held)| *held == role)
            .map(|(identity, held)| (identity.clone(), held))
            .collect()
    }
}

impl FromIterator<(Identity, Role)> for Membership {
    fn from_iter<I: IntoIterator<Item = (Identity, Role)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Membership {
    type Item = (Identity, Role);
    type IntoIter = std::collections::btree_map::IntoIter<Identity, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A team, addressed by organization and slug.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupRef {
    /// Owning organization.
    pub org: String,
    /// Team slug.
    pub name: String,
}

impl GroupRef {
    /// Create a new group reference.
    pub fn new(org: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for GroupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

/// Service accounts that must never be treated as org admins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList(BTreeSet<Identity>);

impl IgnoreList {
    /// Create an ignore list.
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Identity>,
    {
        Self(identities.into_iter().map(Into::into).collect())
    }

    /// Whether an identity is ignored.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.0.contains(identity)
    }

    /// Number of ignored identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Admins of one organization, with ignored accounts already removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgAdminSet(BTreeSet<Identity>);

impl OrgAdminSet {
    /// Build the admin set from a raw directory listing.
    pub fn from_listing(listing: impl IntoIterator<Item = Identity>, ignore: &IgnoreList) -> Self {
        Self(
            listing
                .into_iter()
                .filter(|identity| !ignore.contains(identity.as_str()))
                .collect(),
        )
    }

    /// Whether an identity is an org admin.
    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.0.contains(identity)
    }

    /// Iterate admins in order.
    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.0.iter()
    }

    /// Number of admins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no admins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
