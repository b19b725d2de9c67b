//! Authority filtering.
//!
//! The platform refuses role changes the acting agent is not ranked high
//! enough to make. [`AuthorityFilter`] drops those operations from a plan
//! before anything is dispatched, using ranks snapshotted at fetch time.
//! Directory operations are never filtered.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

use teamsync_core::{PlatformRoleId, StoreKind, TeamIdentity};

use crate::planner::{PlannedOperation, ReconciliationPlan};
use crate::report::OperationOutcome;
use crate::types::MembershipAction;

/// Acting agent rank plus the rank of every role under consideration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritySnapshot {
    /// Highest rank held by the acting agent.
    pub max_rank: i64,
    /// Rank per role; `None` when the role no longer exists.
    pub ranks: BTreeMap<PlatformRoleId, Option<i64>>,
}

impl AuthoritySnapshot {
    /// Snapshot with no roles recorded yet.
    #[must_use]
    pub fn new(max_rank: i64) -> Self {
        Self {
            max_rank,
            ranks: BTreeMap::new(),
        }
    }

    /// Record a role's rank.
    #[must_use]
    pub fn with_rank(mut self, role: PlatformRoleId, rank: Option<i64>) -> Self {
        self.ranks.insert(role, rank);
        self
    }

    /// Rank of a role. Roles not in the snapshot are treated as gone.
    #[must_use]
    pub fn rank_of(&self, role: &PlatformRoleId) -> Option<i64> {
        self.ranks.get(role).copied().flatten()
    }
}

/// Why a role was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The mapping points at a role the platform no longer has.
    RoleNoLongerExists,
    /// The role is ranked at or above the acting agent.
    RankNotBelowAgent { rank: i64, max_rank: i64 },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::RoleNoLongerExists => write!(f, "role no longer exists"),
            ExclusionReason::RankNotBelowAgent { rank, max_rank } => write!(
                f,
                "role rank {rank} is not below acting agent rank {max_rank}"
            ),
        }
    }
}

/// A role the acting agent may not manage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exclusion {
    pub team: TeamIdentity,
    pub reason: ExclusionReason,
}

/// Pure filter over candidate roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorityFilter;

impl AuthorityFilter {
    /// Split candidates into manageable roles and exclusions.
    #[must_use]
    pub fn filter_manageable(
        candidates: &[TeamIdentity],
        authority: &AuthoritySnapshot,
    ) -> (Vec<TeamIdentity>, Vec<Exclusion>) {
        let mut manageable = Vec::with_capacity(candidates.len());
        let mut excluded = Vec::new();

        for team in candidates {
            match Self::check(team, authority) {
                None => manageable.push(team.clone()),
                Some(reason) => excluded.push(Exclusion {
                    team: team.clone(),
                    reason,
                }),
            }
        }

        (manageable, excluded)
    }

    /// Filter the platform lists of a plan. Exclusions come back as skipped
    /// outcomes so they appear in the report.
    #[must_use]
    pub fn apply_to_plan(
        mut plan: ReconciliationPlan,
        authority: &AuthoritySnapshot,
    ) -> (ReconciliationPlan, Vec<OperationOutcome>) {
        let mut skipped = Vec::new();

        let (adds, excluded) = Self::filter_manageable(&plan.platform_roles_to_add, authority);
        plan.platform_roles_to_add = adds;
        skipped.extend(Self::to_outcomes(MembershipAction::Add, excluded));

        let (removes, excluded) =
            Self::filter_manageable(&plan.platform_roles_to_remove, authority);
        plan.platform_roles_to_remove = removes;
        skipped.extend(Self::to_outcomes(MembershipAction::Remove, excluded));

        (plan, skipped)
    }

    fn check(team: &TeamIdentity, authority: &AuthoritySnapshot) -> Option<ExclusionReason> {
        match authority.rank_of(&team.role_id) {
            None => Some(ExclusionReason::RoleNoLongerExists),
            Some(rank) if rank >= authority.max_rank => Some(ExclusionReason::RankNotBelowAgent {
                rank,
                max_rank: authority.max_rank,
            }),
            Some(_) => None,
        }
    }

    fn to_outcomes(
        action: MembershipAction,
        excluded: Vec<Exclusion>,
    ) -> impl Iterator<Item = OperationOutcome> {
        excluded.into_iter().map(move |exclusion| {
            warn!(
                role_id = %exclusion.team.role_id,
                team_id = %exclusion.team.team_id,
                action = %action,
                reason = %exclusion.reason,
                "Role excluded by authority filter"
            );
            let op = PlannedOperation::new(StoreKind::Platform, action, exclusion.team);
            OperationOutcome::skipped(&op, exclusion.reason.to_string())
        })
    }
}
