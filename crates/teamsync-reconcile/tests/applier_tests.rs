//! Change Applier Tests
//!
//! Covers idempotence, partial failure, dry run, ordering of outcomes, and
//! the per-role partitioning of platform operations.

mod common;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::*;
use teamsync_core::{
    Credential, MemberIdentity, PlatformRoleId, PlatformStore, PlatformUserId, StoreError,
    StoreKind, StoreResult,
};
use teamsync_reconcile::memory::InMemoryDirectory;
use teamsync_reconcile::{
    plan, ChangeApplier, MembershipAction, MergePolicy, OutcomeStatus, ReconciliationPlan,
    SyncDirection,
};

fn identity() -> MemberIdentity {
    MemberIdentity::new(member(), user())
}

// =============================================================================
// Manual mock platform
// =============================================================================

/// Platform that tracks in-flight calls per role and overall.
#[derive(Default)]
struct TrackingPlatform {
    in_flight: Mutex<HashMap<PlatformRoleId, usize>>,
    overlapping_same_role: AtomicUsize,
    current: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    fail_role: Option<PlatformRoleId>,
}

impl TrackingPlatform {
    fn failing_on(role: PlatformRoleId) -> Self {
        Self {
            fail_role: Some(role),
            ..Self::default()
        }
    }

    async fn track(&self, role: &PlatformRoleId) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            let count = in_flight.entry(role.clone()).or_insert(0);
            if *count > 0 {
                self.overlapping_same_role.fetch_add(1, Ordering::SeqCst);
            }
            *count += 1;
        }
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(5)).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        *self.in_flight.lock().unwrap().get_mut(role).unwrap() -= 1;

        if self.fail_role.as_ref() == Some(role) {
            return Err(StoreError::rejected("Missing Access"));
        }
        Ok(())
    }
}

#[async_trait]
impl PlatformStore for TrackingPlatform {
    async fn get_member_roles(
        &self,
        _credential: &Credential,
        _user: &PlatformUserId,
    ) -> StoreResult<Vec<PlatformRoleId>> {
        Ok(Vec::new())
    }

    async fn add_role(
        &self,
        _credential: &Credential,
        _user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()> {
        self.track(role).await
    }

    async fn remove_role(
        &self,
        _credential: &Credential,
        _user: &PlatformUserId,
        role: &PlatformRoleId,
    ) -> StoreResult<()> {
        self.track(role).await
    }

    async fn get_role_rank(
        &self,
        _credential: &Credential,
        _role: &PlatformRoleId,
    ) -> StoreResult<Option<i64>> {
        Ok(Some(0))
    }

    async fn get_acting_agent_max_rank(&self, _credential: &Credential) -> StoreResult<i64> {
        Ok(i64::MAX)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_applying_same_plan_twice_is_idempotent() {
    let directory = Arc::new(directory(&[1, 2, 3], &[1]));
    let platform = Arc::new(platform(&[1, 2, 3], &[3], AGENT_MAX));
    let applier = ChangeApplier::new(directory.clone(), platform.clone(), 4, false);

    let plan = plan(
        &set(&[1]),
        &set(&[3]),
        SyncDirection::Both,
        MergePolicy::Union,
    );
    assert_eq!(plan.operation_count(), 2);

    let first = applier.apply(&ctx(), &identity(), &plan).await;
    let second = applier.apply(&ctx(), &identity(), &plan).await;

    assert!(first.iter().all(|o| o.status == OutcomeStatus::Applied));
    assert!(second.iter().all(|o| o.status == OutcomeStatus::Applied));

    assert_eq!(platform_roles(&platform).await, roles(&[1, 3]));
    assert_eq!(directory_teams(&directory).await, teams(&[1, 3]));
    // The second directory add was a no-op read; only one write happened.
    assert_eq!(directory.write_count(), 1);
}

#[tokio::test]
async fn test_removing_absent_membership_reports_applied() {
    let directory = Arc::new(directory(&[1], &[]));
    let platform = Arc::new(platform(&[1], &[], AGENT_MAX));
    let applier = ChangeApplier::new(directory.clone(), platform.clone(), 4, false);

    let mut plan = ReconciliationPlan::empty(SyncDirection::Both, MergePolicy::Overwrite);
    plan.platform_roles_to_remove = vec![pair(1)];
    plan.directory_teams_to_remove = vec![pair(1)];

    let outcomes = applier.apply(&ctx(), &identity(), &plan).await;

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.status == OutcomeStatus::Applied));
    assert_eq!(directory.write_count(), 0);
}

#[tokio::test]
async fn test_failed_directory_write_does_not_block_platform() {
    let directory = Arc::new(InMemoryDirectory::new());
    let platform = Arc::new(platform(&[1, 2], &[], AGENT_MAX));
    let applier = ChangeApplier::new(directory.clone(), platform.clone(), 4, false);

    let mut plan = ReconciliationPlan::empty(SyncDirection::Both, MergePolicy::Union);
    plan.platform_roles_to_add = vec![pair(1)];
    plan.directory_teams_to_add = vec![pair(2)];

    // The directory has no record for the member, so its read fails.
    let outcomes = applier.apply(&ctx(), &identity(), &plan).await;

    assert_eq!(outcomes[0].side, StoreKind::Platform);
    assert_eq!(outcomes[0].status, OutcomeStatus::Applied);
    assert_eq!(outcomes[1].side, StoreKind::Directory);
    assert_eq!(outcomes[1].status, OutcomeStatus::Failed);
    assert!(outcomes[1].reason.as_deref().unwrap().contains("unknown member"));
    assert_eq!(platform_roles(&platform).await, roles(&[1]));
}

#[tokio::test]
async fn test_dry_run_reports_planned() {
    let directory = Arc::new(directory(&[1], &[1]));
    let platform = Arc::new(platform(&[1], &[], AGENT_MAX));
    let applier = ChangeApplier::new(directory.clone(), platform.clone(), 4, true);

    let plan = plan(
        &set(&[1]),
        &set(&[]),
        SyncDirection::DirectoryToPlatform,
        MergePolicy::Union,
    );
    let outcomes = applier.apply(&ctx(), &identity(), &plan).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, OutcomeStatus::Planned);
    assert_eq!(platform.add_count(), 0);
}

#[tokio::test]
async fn test_same_role_operations_never_overlap() {
    let directory = Arc::new(directory(&[], &[]));
    let platform = Arc::new(TrackingPlatform::default());
    let applier = ChangeApplier::new(directory, platform.clone(), 8, false);

    // An add and a remove for the same role, plus unrelated roles.
    let mut plan =
        ReconciliationPlan::empty(SyncDirection::DirectoryToPlatform, MergePolicy::Overwrite);
    plan.platform_roles_to_add = vec![pair(1), pair(2), pair(3)];
    plan.platform_roles_to_remove = vec![pair(1), pair(4)];

    let outcomes = applier.apply(&ctx(), &identity(), &plan).await;

    assert_eq!(outcomes.len(), 5);
    assert_eq!(platform.calls.load(Ordering::SeqCst), 5);
    assert_eq!(platform.overlapping_same_role.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_concurrency_cap_is_respected() {
    let directory = Arc::new(directory(&[], &[]));
    let platform = Arc::new(TrackingPlatform::default());
    let applier = ChangeApplier::new(directory, platform.clone(), 2, false);

    let mut plan =
        ReconciliationPlan::empty(SyncDirection::DirectoryToPlatform, MergePolicy::Union);
    plan.platform_roles_to_add = (1..=6).map(pair).collect();

    applier.apply(&ctx(), &identity(), &plan).await;

    assert!(platform.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(platform.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_outcomes_follow_plan_order() {
    let directory = Arc::new(directory(&[], &[]));
    let platform = Arc::new(TrackingPlatform::failing_on(role(2)));
    let applier = ChangeApplier::new(directory, platform, 4, false);

    let mut plan =
        ReconciliationPlan::empty(SyncDirection::DirectoryToPlatform, MergePolicy::Overwrite);
    plan.platform_roles_to_add = vec![pair(3), pair(1)];
    plan.platform_roles_to_remove = vec![pair(2)];

    let outcomes = applier.apply(&ctx(), &identity(), &plan).await;

    let shape: Vec<_> = outcomes
        .iter()
        .map(|o| (o.team.clone(), o.action, o.status))
        .collect();
    assert_eq!(
        shape,
        vec![
            (pair(3), MembershipAction::Add, OutcomeStatus::Applied),
            (pair(1), MembershipAction::Add, OutcomeStatus::Applied),
            (pair(2), MembershipAction::Remove, OutcomeStatus::Failed),
        ]
    );
}
