//! Sync reports.
//!
//! One [`SyncReport`] per run: the plans that were computed, one
//! [`OperationOutcome`] per planned operation, and the non-fatal warnings
//! collected while reading state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use uuid::Uuid;

use teamsync_core::{DirectoryTeamId, MemberIdentity, PlatformRoleId, StoreKind, TeamIdentity};

use crate::planner::{PlannedOperation, ReconciliationPlan};
use crate::types::{MembershipAction, MergePolicy, OutcomeStatus, SyncDirection, SyncState};

/// Result of one planned operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    /// Store the operation targeted.
    pub side: StoreKind,
    pub action: MembershipAction,
    pub team: TeamIdentity,
    pub status: OutcomeStatus,
    /// Exclusion reason or upstream error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OperationOutcome {
    fn from_operation(
        op: &PlannedOperation,
        status: OutcomeStatus,
        reason: Option<String>,
    ) -> Self {
        Self {
            side: op.side,
            action: op.action,
            team: op.team.clone(),
            status,
            reason,
        }
    }

    /// The store holds the requested state.
    #[must_use]
    pub fn applied(op: &PlannedOperation) -> Self {
        Self::from_operation(op, OutcomeStatus::Applied, None)
    }

    /// Excluded before dispatch.
    pub fn skipped(op: &PlannedOperation, reason: impl Into<String>) -> Self {
        Self::from_operation(op, OutcomeStatus::Skipped, Some(reason.into()))
    }

    /// Rejected by the store.
    pub fn failed(op: &PlannedOperation, message: impl Into<String>) -> Self {
        Self::from_operation(op, OutcomeStatus::Failed, Some(message.into()))
    }

    /// Not sent (dry run).
    #[must_use]
    pub fn planned(op: &PlannedOperation) -> Self {
        Self::from_operation(op, OutcomeStatus::Planned, None)
    }

    /// Check if the operation failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failed
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match self.side {
            StoreKind::Platform => format!("role {}", self.team.role_id),
            StoreKind::Directory => format!("team {}", self.team.team_id),
        };
        write!(
            f,
            "[{}] {} {} {}",
            self.status, self.side, self.action, target
        )?;
        if let Some(reason) = &self.reason {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

/// Kind of non-fatal issue found while reading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// Directory team without a platform role.
    UnmappedTeam,
    /// Platform role without a directory team.
    UnmappedRole,
    /// Platform role mapped from more than one directory team.
    AmbiguousRole,
}

/// A non-fatal issue recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWarning {
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<DirectoryTeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<PlatformRoleId>,
}

impl SyncWarning {
    /// Directory team with no platform role configured.
    #[must_use]
    pub fn unmapped_team(team_id: DirectoryTeamId) -> Self {
        Self {
            kind: WarningKind::UnmappedTeam,
            message: format!("team {team_id} has no platform role configured"),
            team_id: Some(team_id),
            role_id: None,
        }
    }

    /// Platform role with no matching directory team.
    #[must_use]
    pub fn unmapped_role(role_id: PlatformRoleId) -> Self {
        Self {
            kind: WarningKind::UnmappedRole,
            message: format!("role {role_id} has no matching directory team"),
            team_id: None,
            role_id: Some(role_id),
        }
    }

    /// Platform role that several directory teams point at.
    #[must_use]
    pub fn ambiguous_role(role_id: PlatformRoleId, held: &[DirectoryTeamId]) -> Self {
        let teams: Vec<String> = held.iter().map(ToString::to_string).collect();
        Self {
            kind: WarningKind::AmbiguousRole,
            message: format!(
                "role {role_id} is mapped from more than one directory team; \
                 matched to the member's team(s) {}",
                teams.join(", ")
            ),
            team_id: None,
            role_id: Some(role_id),
        }
    }
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub applied: usize,
    pub skipped: usize,
    pub failed: usize,
    pub planned: usize,
    pub warnings: usize,
}

impl ReportSummary {
    /// Count outcomes and warnings.
    #[must_use]
    pub fn from_outcomes(outcomes: &[OperationOutcome], warnings: usize) -> Self {
        let count = |status| outcomes.iter().filter(|o| o.status == status).count();
        Self {
            applied: count(OutcomeStatus::Applied),
            skipped: count(OutcomeStatus::Skipped),
            failed: count(OutcomeStatus::Failed),
            planned: count(OutcomeStatus::Planned),
            warnings,
        }
    }

    /// Total operations.
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failed + self.planned
    }
}

/// Report for one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: Uuid,
    pub member: MemberIdentity,
    pub direction: SyncDirection,
    pub policy: MergePolicy,
    /// Final state of the run.
    pub state: SyncState,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// One plan per one-way direction, after authority filtering.
    pub plans: Vec<ReconciliationPlan>,
    pub outcomes: Vec<OperationOutcome>,
    #[serde(default)]
    pub warnings: Vec<SyncWarning>,
    pub summary: ReportSummary,
}

impl SyncReport {
    /// Start a report for a resolved member.
    #[must_use]
    pub fn new(
        run_id: Uuid,
        member: MemberIdentity,
        direction: SyncDirection,
        policy: MergePolicy,
        dry_run: bool,
    ) -> Self {
        Self {
            run_id,
            member,
            direction,
            policy,
            state: SyncState::ResolvingIdentity,
            dry_run,
            started_at: Utc::now(),
            completed_at: None,
            plans: Vec::new(),
            outcomes: Vec::new(),
            warnings: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    /// Close the report in its final state and compute the summary.
    pub fn finish(&mut self, state: SyncState) {
        self.state = state;
        self.completed_at = Some(Utc::now());
        self.summary = ReportSummary::from_outcomes(&self.outcomes, self.warnings.len());
    }

    /// Check if any operation failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(OperationOutcome::is_failure)
    }

    /// Check if the run finished with no failures, skips or warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.summary.failed == 0 && self.summary.skipped == 0 && self.warnings.is_empty()
    }

    /// Failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    /// Human-readable rendering.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let mode = if self.dry_run { ", dry run" } else { "" };

        let _ = writeln!(out, "Sync run {}", self.run_id);
        let _ = writeln!(out, "  member:    {}", self.member);
        let _ = writeln!(out, "  direction: {} (policy {}{mode})", self.direction, self.policy);
        let _ = writeln!(out, "  state:     {}", self.state);
        let _ = writeln!(
            out,
            "  result:    {} applied, {} skipped, {} failed, {} planned, {} warnings",
            self.summary.applied,
            self.summary.skipped,
            self.summary.failed,
            self.summary.planned,
            self.summary.warnings
        );

        if self.outcomes.is_empty() {
            let _ = writeln!(out, "Nothing to change.");
        } else {
            let _ = writeln!(out, "Operations:");
            for outcome in &self.outcomes {
                let _ = writeln!(out, "  {outcome}");
            }
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(out, "Warnings:");
            for warning in &self.warnings {
                let _ = writeln!(out, "  - {}", warning.message);
            }
        }

        out
    }
}
