//! Membership sets.
//!
//! A [`MembershipSet`] is one side's view of a member's teams, already
//! translated into [`TeamIdentity`] pairs. Sets are keyed by directory team
//! so set algebra between the two sides is a key comparison, and iteration
//! order is deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use teamsync_core::{DirectoryTeamId, PlatformRoleId, TeamIdentity};

/// A deduplicated set of team identities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TeamIdentity>", into = "Vec<TeamIdentity>")]
pub struct MembershipSet {
    entries: BTreeMap<DirectoryTeamId, TeamIdentity>,
}

impl MembershipSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a team. Returns `false` when the team was already present; the
    /// first pairing seen for a team is kept.
    pub fn insert(&mut self, team: TeamIdentity) -> bool {
        if self.entries.contains_key(&team.team_id) {
            return false;
        }
        self.entries.insert(team.team_id, team);
        true
    }

    /// Teams in `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &MembershipSet) -> MembershipSet {
        self.entries
            .values()
            .filter(|team| !other.contains_team(team.team_id))
            .cloned()
            .collect()
    }

    /// Teams in either set. Pairings from `self` win on overlap.
    #[must_use]
    pub fn union(&self, other: &MembershipSet) -> MembershipSet {
        let mut merged = self.clone();
        for team in other.iter() {
            merged.insert(team.clone());
        }
        merged
    }

    /// Check if the team is in the set.
    #[must_use]
    pub fn contains_team(&self, team_id: DirectoryTeamId) -> bool {
        self.entries.contains_key(&team_id)
    }

    /// Number of teams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate in directory team order.
    pub fn iter(&self) -> impl Iterator<Item = &TeamIdentity> {
        self.entries.values()
    }

    /// Directory team IDs in the set.
    #[must_use]
    pub fn team_ids(&self) -> Vec<DirectoryTeamId> {
        self.entries.keys().copied().collect()
    }

    /// Platform role IDs in the set.
    #[must_use]
    pub fn role_ids(&self) -> Vec<PlatformRoleId> {
        self.entries.values().map(|team| team.role_id.clone()).collect()
    }
}

impl FromIterator<TeamIdentity> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = TeamIdentity>>(iter: I) -> Self {
        let mut set = MembershipSet::new();
        for team in iter {
            set.insert(team);
        }
        set
    }
}

impl IntoIterator for MembershipSet {
    type Item = TeamIdentity;
    type IntoIter = std::collections::btree_map::IntoValues<DirectoryTeamId, TeamIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl From<Vec<TeamIdentity>> for MembershipSet {
    fn from(teams: Vec<TeamIdentity>) -> Self {
        teams.into_iter().collect()
    }
}

impl From<MembershipSet> for Vec<TeamIdentity> {
    fn from(set: MembershipSet) -> Self {
        set.into_iter().collect()
    }
}
