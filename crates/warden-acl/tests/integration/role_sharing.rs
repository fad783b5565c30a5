//! Role sharing and role cache staleness through the authorizer.

use chrono::Duration;
use warden_acl::{AuthorizerConfig, EmbargoConfig, PolicyKind};

use crate::common::{TestHarness, user};

#[tokio::test]
async fn test_shared_role_writes_as_owner_group() {
    let harness = TestHarness::new();
    let posix = harness.authorizer_with(PolicyKind::Posix).await;
    let sharing = harness.authorizer_with(PolicyKind::RoleSharing).await;
    let bob = user("bob", "vo_user");

    let denied = posix.has_access("addFile", &["/vo/prod/new.dat"], &bob).await.unwrap();
    assert_eq!(denied.successful().get("/vo/prod/new.dat"), Some(&false));

    let granted = sharing.has_access("addFile", &["/vo/prod/new.dat"], &bob).await.unwrap();
    assert_eq!(granted.successful().get("/vo/prod/new.dat"), Some(&true));
}

#[tokio::test]
async fn test_roleless_group_gets_nothing_extra() {
    let harness = TestHarness::new();
    let sharing = harness.authorizer_with(PolicyKind::RoleSharing).await;

    let result = sharing
        .has_access("addFile", &["/vo/prod/new.dat"], &user("eve", "outsiders"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/vo/prod/new.dat"), Some(&false));
}

#[tokio::test]
async fn test_new_group_visible_after_ttl() {
    let harness = TestHarness::new();
    let sharing = harness.authorizer_with(PolicyKind::RoleSharing).await;
    harness.catalog.add_group("vo_extra", Some("/vo"));
    let carl = user("carl", "vo_extra");

    harness.clock.advance(Duration::seconds(300));
    let stale = sharing.has_access("addFile", &["/vo/prod/x"], &carl).await.unwrap();
    assert_eq!(stale.successful().get("/vo/prod/x"), Some(&false));

    harness.clock.advance(Duration::seconds(301));
    let fresh = sharing.has_access("addFile", &["/vo/prod/x"], &carl).await.unwrap();
    assert_eq!(fresh.successful().get("/vo/prod/x"), Some(&true));
}

#[tokio::test]
async fn test_failed_rebuild_keeps_old_snapshot() {
    let harness = TestHarness::new();
    let sharing = harness.authorizer_with(PolicyKind::RoleSharing).await;
    harness.catalog.fail_group_listing(true);
    harness.clock.advance(Duration::seconds(601));

    let result = sharing
        .has_access("addFile", &["/vo/prod/x"], &user("bob", "vo_user"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/vo/prod/x"), Some(&true));
}

#[tokio::test]
async fn test_embargo_can_share_roles() {
    let harness = TestHarness::new();
    let config = AuthorizerConfig {
        policy: PolicyKind::Embargo,
        embargo: EmbargoConfig {
            share_roles: true,
            ..EmbargoConfig::default()
        },
        ..AuthorizerConfig::default()
    };
    let authz = harness.authorizer(&config).await;

    let result = authz
        .has_access("addFile", &["/vo/prod/new.dat"], &user("bob", "vo_user"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/vo/prod/new.dat"), Some(&true));
}
