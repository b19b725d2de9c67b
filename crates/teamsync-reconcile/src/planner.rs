//! Reconciliation planning.
//!
//! [`plan`] is pure set algebra over two [`MembershipSet`] snapshots. It
//! performs no I/O and knows nothing about authority; the caller filters the
//! platform lists afterwards.
//!
//! | direction | policy | platform add | platform remove | directory add | directory remove |
//! |---|---|---|---|---|---|
//! | directory-to-platform | union | D - P | - | - | - |
//! | directory-to-platform | overwrite | D - P | P - D | - | - |
//! | platform-to-directory | union | - | - | P - D | - |
//! | platform-to-directory | overwrite | - | - | P - D | D - P |
//! | both | either | as above, each side planned independently | | | |

use serde::{Deserialize, Serialize};

use teamsync_core::{StoreKind, TeamIdentity};

use crate::membership::MembershipSet;
use crate::types::{MembershipAction, MergePolicy, SyncDirection};

/// Add/remove lists for both sides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// Direction the plan was computed for.
    pub direction: SyncDirection,
    /// Policy the plan was computed under.
    pub policy: MergePolicy,
    pub platform_roles_to_add: Vec<TeamIdentity>,
    pub platform_roles_to_remove: Vec<TeamIdentity>,
    pub directory_teams_to_add: Vec<TeamIdentity>,
    pub directory_teams_to_remove: Vec<TeamIdentity>,
}

/// A single operation from a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedOperation {
    /// Store the operation targets.
    pub side: StoreKind,
    pub action: MembershipAction,
    pub team: TeamIdentity,
}

impl PlannedOperation {
    /// Create a planned operation.
    #[must_use]
    pub fn new(side: StoreKind, action: MembershipAction, team: TeamIdentity) -> Self {
        Self { side, action, team }
    }
}

impl ReconciliationPlan {
    /// An empty plan.
    #[must_use]
    pub fn empty(direction: SyncDirection, policy: MergePolicy) -> Self {
        Self {
            direction,
            policy,
            platform_roles_to_add: Vec::new(),
            platform_roles_to_remove: Vec::new(),
            directory_teams_to_add: Vec::new(),
            directory_teams_to_remove: Vec::new(),
        }
    }

    /// Check if nothing needs to change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }

    /// Total number of operations across all four lists.
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.platform_roles_to_add.len()
            + self.platform_roles_to_remove.len()
            + self.directory_teams_to_add.len()
            + self.directory_teams_to_remove.len()
    }

    /// Flatten into individual operations: platform adds, platform removes,
    /// directory adds, directory removes.
    #[must_use]
    pub fn operations(&self) -> Vec<PlannedOperation> {
        let lists = [
            (StoreKind::Platform, MembershipAction::Add, &self.platform_roles_to_add),
            (StoreKind::Platform, MembershipAction::Remove, &self.platform_roles_to_remove),
            (StoreKind::Directory, MembershipAction::Add, &self.directory_teams_to_add),
            (StoreKind::Directory, MembershipAction::Remove, &self.directory_teams_to_remove),
        ];

        lists
            .into_iter()
            .flat_map(|(side, action, teams)| {
                teams
                    .iter()
                    .map(move |team| PlannedOperation::new(side, action, team.clone()))
            })
            .collect()
    }

    /// Drop any removal that also appears in the same side's add list.
    fn apply_tie_break(&mut self) {
        let platform_adds: MembershipSet = self.platform_roles_to_add.iter().cloned().collect();
        self.platform_roles_to_remove
            .retain(|team| !platform_adds.contains_team(team.team_id));

        let directory_adds: MembershipSet = self.directory_teams_to_add.iter().cloned().collect();
        self.directory_teams_to_remove
            .retain(|team| !directory_adds.contains_team(team.team_id));
    }
}

/// Compute the operations that bring the stores into agreement.
#[must_use]
pub fn plan(
    directory: &MembershipSet,
    platform: &MembershipSet,
    direction: SyncDirection,
    policy: MergePolicy,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::empty(direction, policy);
    let overwrite = policy == MergePolicy::Overwrite;

    if direction.writes_platform() {
        plan.platform_roles_to_add = directory.difference(platform).into();
        if overwrite {
            plan.platform_roles_to_remove = platform.difference(directory).into();
        }
    }

    if direction.writes_directory() {
        plan.directory_teams_to_add = platform.difference(directory).into();
        if overwrite {
            plan.directory_teams_to_remove = directory.difference(platform).into();
        }
    }

    plan.apply_tie_break();
    plan
}
