//! Membership Fetcher and Identity Resolver Tests

mod common;

use std::sync::Arc;

use common::*;
use teamsync_core::{MemberIdentity, MemberRef, StoreKind};
use teamsync_reconcile::{IdentityResolver, MembershipFetcher, SyncError, WarningKind};

#[tokio::test]
async fn test_fetch_without_identity_fails() {
    let fetcher = MembershipFetcher::new(
        Arc::new(directory(&[1], &[1])),
        Arc::new(platform(&[1], &[1], AGENT_MAX)),
    );

    let err = fetcher.fetch(&ctx(), None, true).await.unwrap_err();
    assert_eq!(err, SyncError::IdentityNotResolved);
}

#[tokio::test]
async fn test_fetch_translates_both_sides() {
    let directory = Arc::new(
        directory(&[1, 2, 3], &[1, 2])
            .with_team(team(8), None)
            .with_member(member(), Some(user()), vec![team(1), team(2), team(8), team(2)]),
    );
    let platform = Arc::new(platform(&[1, 2, 3, 9], &[2, 3, 9, 3], AGENT_MAX));
    let fetcher = MembershipFetcher::new(directory, platform);

    let identity = MemberIdentity::new(member(), user());
    let snapshot = fetcher.fetch(&ctx(), Some(&identity), false).await.unwrap();

    assert_eq!(snapshot.directory, set(&[1, 2]));
    assert_eq!(snapshot.platform, set(&[2, 3]));
    assert!(snapshot.authority.is_none());

    let kinds: Vec<_> = snapshot.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(kinds, vec![WarningKind::UnmappedTeam, WarningKind::UnmappedRole]);
    assert_eq!(snapshot.warnings[0].team_id, Some(team(8)));
    assert_eq!(snapshot.warnings[1].role_id, Some(role(9)));
}

#[tokio::test]
async fn test_fetch_pairs_shared_role_with_members_teams() {
    // T1, T2 and T3 all map to R5; the member sits in T2 and T3.
    let directory = Arc::new(
        teamsync_reconcile::memory::InMemoryDirectory::new()
            .with_team(team(1), Some(role(5)))
            .with_team(team(2), Some(role(5)))
            .with_team(team(3), Some(role(5)))
            .with_member(member(), Some(user()), vec![team(2), team(3)]),
    );
    let platform = Arc::new(platform(&[5], &[5], AGENT_MAX));
    let fetcher = MembershipFetcher::new(directory, platform);

    let identity = MemberIdentity::new(member(), user());
    let snapshot = fetcher.fetch(&ctx(), Some(&identity), false).await.unwrap();

    assert_eq!(snapshot.directory, snapshot.platform);
    assert_eq!(snapshot.platform.team_ids(), vec![team(2), team(3)]);
    assert_eq!(snapshot.warnings.len(), 1);
    assert_eq!(snapshot.warnings[0].kind, WarningKind::AmbiguousRole);
    assert_eq!(snapshot.warnings[0].role_id, Some(role(5)));
}

#[tokio::test]
async fn test_fetch_empty_sets_are_valid() {
    let fetcher = MembershipFetcher::new(
        Arc::new(directory(&[1], &[])),
        Arc::new(platform(&[1], &[], AGENT_MAX)),
    );

    let identity = MemberIdentity::new(member(), user());
    let snapshot = fetcher.fetch(&ctx(), Some(&identity), true).await.unwrap();

    assert!(snapshot.directory.is_empty());
    assert!(snapshot.platform.is_empty());
    assert!(snapshot.warnings.is_empty());
    let authority = snapshot.authority.unwrap();
    assert_eq!(authority.max_rank, AGENT_MAX);
    assert!(authority.ranks.is_empty());
}

#[tokio::test]
async fn test_fetch_snapshots_ranks_for_both_sides() {
    // Team 4 maps to role-4, which the platform has deleted.
    let directory = Arc::new(directory(&[1, 2, 4], &[1, 4]));
    let platform = Arc::new(platform(&[1, 2], &[2], 7));
    let fetcher = MembershipFetcher::new(directory, platform);

    let identity = MemberIdentity::new(member(), user());
    let snapshot = fetcher.fetch(&ctx(), Some(&identity), true).await.unwrap();
    let authority = snapshot.authority.unwrap();

    assert_eq!(authority.max_rank, 7);
    assert_eq!(authority.rank_of(&role(1)), Some(1));
    assert_eq!(authority.rank_of(&role(2)), Some(2));
    assert_eq!(authority.rank_of(&role(4)), None);
    assert_eq!(authority.ranks.len(), 3);
}

#[tokio::test]
async fn test_fetch_platform_offline() {
    let platform = Arc::new(platform(&[1], &[1], AGENT_MAX));
    platform.set_offline(true);
    let fetcher = MembershipFetcher::new(Arc::new(directory(&[1], &[1])), platform);

    let identity = MemberIdentity::new(member(), user());
    let err = fetcher.fetch(&ctx(), Some(&identity), false).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::UpstreamUnavailable {
            store: StoreKind::Platform,
            ..
        }
    ));
}

#[tokio::test]
async fn test_resolver_both_directions() {
    let resolver = IdentityResolver::new(Arc::new(directory(&[], &[])));

    let from_directory = resolver
        .resolve(&ctx(), &MemberRef::Directory(member()))
        .await
        .unwrap();
    let from_platform = resolver
        .resolve(&ctx(), &MemberRef::Platform(user()))
        .await
        .unwrap();

    assert_eq!(from_directory, from_platform);
    assert_eq!(from_directory.platform_id(), &user());
    assert_eq!(from_platform.directory_id(), member());
}
