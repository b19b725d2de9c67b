//! Property tests for the planner and authority filter.

mod common;

use proptest::prelude::*;
use std::collections::BTreeSet;

use common::{pair, role, set};
use teamsync_core::TeamIdentity;
use teamsync_reconcile::{
    plan, AuthorityFilter, AuthoritySnapshot, MembershipSet, MergePolicy, ReconciliationPlan,
    SyncDirection,
};

fn ids() -> impl Strategy<Value = BTreeSet<u128>> {
    prop::collection::btree_set(0u128..24, 0..12)
}

fn any_direction() -> impl Strategy<Value = SyncDirection> {
    prop_oneof![
        Just(SyncDirection::PlatformToDirectory),
        Just(SyncDirection::DirectoryToPlatform),
        Just(SyncDirection::Both),
    ]
}

fn any_policy() -> impl Strategy<Value = MergePolicy> {
    prop_oneof![Just(MergePolicy::Union), Just(MergePolicy::Overwrite)]
}

fn to_set(ids: &BTreeSet<u128>) -> MembershipSet {
    set(&ids.iter().copied().collect::<Vec<_>>())
}

/// Apply one side's lists to that side's set.
fn apply_side(
    current: &MembershipSet,
    add: &[TeamIdentity],
    remove: &[TeamIdentity],
) -> MembershipSet {
    let removed: MembershipSet = remove.iter().cloned().collect();
    current
        .difference(&removed)
        .union(&add.iter().cloned().collect())
}

fn no_overlap(add: &[TeamIdentity], remove: &[TeamIdentity]) -> bool {
    let adds: MembershipSet = add.iter().cloned().collect();
    remove.iter().all(|team| !adds.contains_team(team.team_id))
}

proptest! {
    #[test]
    fn union_directory_to_platform_adds_difference_only(a in ids(), b in ids()) {
        let (a, b) = (to_set(&a), to_set(&b));
        let plan = plan(&a, &b, SyncDirection::DirectoryToPlatform, MergePolicy::Union);

        prop_assert_eq!(MembershipSet::from(plan.platform_roles_to_add.clone()), a.difference(&b));
        prop_assert!(plan.platform_roles_to_remove.is_empty());
        prop_assert!(plan.directory_teams_to_add.is_empty());
        prop_assert!(plan.directory_teams_to_remove.is_empty());
    }

    #[test]
    fn union_never_removes(a in ids(), b in ids(), direction in any_direction()) {
        let plan = plan(&to_set(&a), &to_set(&b), direction, MergePolicy::Union);
        prop_assert!(plan.platform_roles_to_remove.is_empty());
        prop_assert!(plan.directory_teams_to_remove.is_empty());
    }

    #[test]
    fn add_and_remove_never_overlap(a in ids(), b in ids(), direction in any_direction(), policy in any_policy()) {
        let plan = plan(&to_set(&a), &to_set(&b), direction, policy);
        prop_assert!(no_overlap(&plan.platform_roles_to_add, &plan.platform_roles_to_remove));
        prop_assert!(no_overlap(&plan.directory_teams_to_add, &plan.directory_teams_to_remove));
    }

    #[test]
    fn direction_selects_sides(a in ids(), b in ids(), policy in any_policy()) {
        let (a, b) = (to_set(&a), to_set(&b));

        let to_platform = plan(&a, &b, SyncDirection::DirectoryToPlatform, policy);
        prop_assert!(to_platform.directory_teams_to_add.is_empty());
        prop_assert!(to_platform.directory_teams_to_remove.is_empty());

        let to_directory = plan(&a, &b, SyncDirection::PlatformToDirectory, policy);
        prop_assert!(to_directory.platform_roles_to_add.is_empty());
        prop_assert!(to_directory.platform_roles_to_remove.is_empty());

        // Both is the two one-way plans side by side.
        let both = plan(&a, &b, SyncDirection::Both, policy);
        prop_assert_eq!(&both.platform_roles_to_add, &to_platform.platform_roles_to_add);
        prop_assert_eq!(&both.platform_roles_to_remove, &to_platform.platform_roles_to_remove);
        prop_assert_eq!(&both.directory_teams_to_add, &to_directory.directory_teams_to_add);
        prop_assert_eq!(&both.directory_teams_to_remove, &to_directory.directory_teams_to_remove);
    }

    #[test]
    fn both_union_round_trip_reaches_union(a in ids(), b in ids()) {
        let (a, b) = (to_set(&a), to_set(&b));
        let plan = plan(&a, &b, SyncDirection::Both, MergePolicy::Union);

        let directory_after = apply_side(&a, &plan.directory_teams_to_add, &plan.directory_teams_to_remove);
        let platform_after = apply_side(&b, &plan.platform_roles_to_add, &plan.platform_roles_to_remove);

        prop_assert_eq!(&directory_after, &a.union(&b));
        prop_assert_eq!(&platform_after, &a.union(&b));
    }

    #[test]
    fn overwrite_makes_target_match_source(a in ids(), b in ids()) {
        let (a, b) = (to_set(&a), to_set(&b));

        let to_platform = plan(&a, &b, SyncDirection::DirectoryToPlatform, MergePolicy::Overwrite);
        let platform_after = apply_side(&b, &to_platform.platform_roles_to_add, &to_platform.platform_roles_to_remove);
        prop_assert_eq!(&platform_after, &a);

        let to_directory = plan(&a, &b, SyncDirection::PlatformToDirectory, MergePolicy::Overwrite);
        let directory_after = apply_side(&a, &to_directory.directory_teams_to_add, &to_directory.directory_teams_to_remove);
        prop_assert_eq!(&directory_after, &b);
    }

    #[test]
    fn filtered_plan_holds_only_manageable_roles(
        a in ids(),
        b in ids(),
        max_rank in 0i64..24,
        deleted in ids(),
    ) {
        let (a, b) = (to_set(&a), to_set(&b));
        let plan = plan(&a, &b, SyncDirection::Both, MergePolicy::Overwrite);

        // role-n has rank n unless deleted.
        let authority = (0u128..24).fold(AuthoritySnapshot::new(max_rank), |snapshot, n| {
            let rank = if deleted.contains(&n) { None } else { Some(n as i64) };
            snapshot.with_rank(role(n), rank)
        });

        let before = plan.operation_count();
        let directory_ops = (plan.directory_teams_to_add.clone(), plan.directory_teams_to_remove.clone());
        let (filtered, skipped): (ReconciliationPlan, _) = AuthorityFilter::apply_to_plan(plan, &authority);

        for team in filtered.platform_roles_to_add.iter().chain(&filtered.platform_roles_to_remove) {
            let rank = authority.rank_of(&team.role_id);
            prop_assert!(matches!(rank, Some(r) if r < max_rank));
        }
        prop_assert_eq!(filtered.operation_count() + skipped.len(), before);
        prop_assert_eq!((filtered.directory_teams_to_add, filtered.directory_teams_to_remove), directory_ops);
    }
}

#[test]
fn scenario_rank_equal_to_agent_is_excluded() {
    let authority = AuthoritySnapshot::new(5).with_rank(role(5), Some(5));
    let (manageable, excluded) = AuthorityFilter::filter_manageable(&[pair(5)], &authority);
    assert!(manageable.is_empty());
    assert_eq!(excluded.len(), 1);
}

#[test]
fn scenario_overwrite_removes_only_extra_role() {
    let plan = plan(
        &set(&[1]),
        &set(&[1, 2]),
        SyncDirection::DirectoryToPlatform,
        MergePolicy::Overwrite,
    );
    assert!(plan.platform_roles_to_add.is_empty());
    assert_eq!(plan.platform_roles_to_remove, vec![pair(2)]);
}
