//! Change application.
//!
//! Executes a filtered [`ReconciliationPlan`] against both stores. Every
//! operation gets exactly one [`OperationOutcome`]; a failed operation never
//! stops the others and nothing is rolled back.
//!
//! Platform operations are partitioned by role and partitions run
//! concurrently up to the configured cap. Directory operations share one
//! partition because the directory only supports replacing a member's whole
//! team list.

use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use teamsync_core::{
    CallContext, DirectoryStore, MemberIdentity, PlatformRoleId, PlatformStore, StoreKind,
};

use crate::planner::{PlannedOperation, ReconciliationPlan};
use crate::report::OperationOutcome;
use crate::types::MembershipAction;

/// Applies plans to the stores.
#[derive(Clone)]
pub struct ChangeApplier {
    directory: Arc<dyn DirectoryStore>,
    platform: Arc<dyn PlatformStore>,
    max_concurrency: usize,
    dry_run: bool,
}

impl ChangeApplier {
    /// Create an applier.
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryStore>,
        platform: Arc<dyn PlatformStore>,
        max_concurrency: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            directory,
            platform,
            max_concurrency: max_concurrency.max(1),
            dry_run,
        }
    }

    /// Apply every operation in `plan`, returning outcomes in plan order.
    #[instrument(skip(self, ctx, member, plan), fields(
        request_id = %ctx.request_id(),
        member = %member,
        direction = %plan.direction,
        operations = plan.operation_count(),
    ))]
    pub async fn apply(
        &self,
        ctx: &CallContext,
        member: &MemberIdentity,
        plan: &ReconciliationPlan,
    ) -> Vec<OperationOutcome> {
        let operations = plan.operations();

        if self.dry_run {
            info!("Dry run, no changes sent");
            return operations.iter().map(OperationOutcome::planned).collect();
        }

        let mut platform_partitions: BTreeMap<PlatformRoleId, Vec<(usize, PlannedOperation)>> =
            BTreeMap::new();
        let mut directory_partition = Vec::new();

        for (index, op) in operations.into_iter().enumerate() {
            match op.side {
                StoreKind::Platform => platform_partitions
                    .entry(op.team.role_id.clone())
                    .or_default()
                    .push((index, op)),
                StoreKind::Directory => directory_partition.push((index, op)),
            }
        }

        let platform_work = stream::iter(platform_partitions.into_values())
            .map(|partition| self.run_platform_partition(ctx, member, partition))
            .buffer_unordered(self.max_concurrency)
            .collect::<Vec<_>>();
        let directory_work = self.run_directory_partition(ctx, member, directory_partition);

        let (platform_results, directory_results) = tokio::join!(platform_work, directory_work);

        let mut indexed: Vec<(usize, OperationOutcome)> = platform_results
            .into_iter()
            .flatten()
            .chain(directory_results)
            .collect();
        indexed.sort_by_key(|(index, _)| *index);

        indexed.into_iter().map(|(_, outcome)| outcome).collect()
    }

    async fn run_platform_partition(
        &self,
        ctx: &CallContext,
        member: &MemberIdentity,
        partition: Vec<(usize, PlannedOperation)>,
    ) -> Vec<(usize, OperationOutcome)> {
        let mut outcomes = Vec::with_capacity(partition.len());
        for (index, op) in partition {
            outcomes.push((index, self.apply_platform(ctx, member, &op).await));
        }
        outcomes
    }

    async fn apply_platform(
        &self,
        ctx: &CallContext,
        member: &MemberIdentity,
        op: &PlannedOperation,
    ) -> OperationOutcome {
        let user = member.platform_id();
        let role = &op.team.role_id;

        let result = match op.action {
            MembershipAction::Add => self.platform.add_role(ctx.platform(), user, role).await,
            MembershipAction::Remove => self.platform.remove_role(ctx.platform(), user, role).await,
        };

        match result {
            Ok(()) => {
                debug!(role_id = %role, action = %op.action, "Platform role updated");
                OperationOutcome::applied(op)
            }
            Err(e) if e.is_noop() => {
                debug!(
                    role_id = %role,
                    action = %op.action,
                    "Platform role already in requested state"
                );
                OperationOutcome::applied(op)
            }
            Err(e) => {
                warn!(
                    role_id = %role,
                    action = %op.action,
                    store = %StoreKind::Platform,
                    error = %e,
                    "Platform operation failed"
                );
                OperationOutcome::failed(op, e.to_string())
            }
        }
    }

    async fn run_directory_partition(
        &self,
        ctx: &CallContext,
        member: &MemberIdentity,
        partition: Vec<(usize, PlannedOperation)>,
    ) -> Vec<(usize, OperationOutcome)> {
        let mut outcomes = Vec::with_capacity(partition.len());
        for (index, op) in partition {
            outcomes.push((index, self.apply_directory(ctx, member, &op).await));
        }
        outcomes
    }

    /// Read-modify-write on the member's team list. Teams outside the plan
    /// are carried over untouched.
    async fn apply_directory(
        &self,
        ctx: &CallContext,
        member: &MemberIdentity,
        op: &PlannedOperation,
    ) -> OperationOutcome {
        let member_id = member.directory_id();
        let team_id = op.team.team_id;

        let mut teams = match self
            .directory
            .get_member_teams(ctx.directory(), member_id)
            .await
        {
            Ok(teams) => teams,
            Err(e) => {
                warn!(
                    team_id = %team_id,
                    action = %op.action,
                    store = %StoreKind::Directory,
                    error = %e,
                    "Could not read member teams"
                );
                return OperationOutcome::failed(op, e.to_string());
            }
        };

        let present = teams.contains(&team_id);
        match (op.action, present) {
            (MembershipAction::Add, true) | (MembershipAction::Remove, false) => {
                debug!(
                    team_id = %team_id,
                    action = %op.action,
                    "Directory team already in requested state"
                );
                return OperationOutcome::applied(op);
            }
            (MembershipAction::Add, false) => teams.push(team_id),
            (MembershipAction::Remove, true) => teams.retain(|t| *t != team_id),
        }

        match self
            .directory
            .set_member_teams(ctx.directory(), member_id, &teams)
            .await
        {
            Ok(()) => {
                debug!(team_id = %team_id, action = %op.action, "Directory team updated");
                OperationOutcome::applied(op)
            }
            Err(e) if e.is_noop() => OperationOutcome::applied(op),
            Err(e) => {
                warn!(
                    team_id = %team_id,
                    action = %op.action,
                    store = %StoreKind::Directory,
                    error = %e,
                    "Directory operation failed"
                );
                OperationOutcome::failed(op, e.to_string())
            }
        }
    }
}
