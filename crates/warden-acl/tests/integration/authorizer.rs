//! Dispatcher behavior under the plain POSIX policy.

use warden_acl::{AuthorizerConfig, Operation, PolicyKind};
use warden_core::{Capability, Error, Identity, PermissionBits};

use crate::common::{TestHarness, user};

#[tokio::test]
async fn test_admin_gets_everything() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let admin = Identity::new("ops", "outsiders").with_capability(Capability::FileCatalogManagement);

    for op in Operation::ALL {
        let result = authz
            .has_access(op.name(), &["/vo/prod/run.dat", "/does/not/exist"], &admin)
            .await
            .unwrap();
        assert_eq!(result.successful().len(), 2, "{op}");
        assert!(result.successful().values().all(|allowed| *allowed), "{op}");
    }
}

#[tokio::test]
async fn test_unknown_operation_fails_whole_call() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let before = harness.catalog.call_count();

    let err = authz
        .has_access("moveFile", &["/vo/user/data.root"], &user("alice", "vo_user"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { .. }));
    assert!(err.aborts_call());
    assert_eq!(harness.catalog.call_count(), before);
}

#[tokio::test]
async fn test_empty_path_fails_whole_call() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let err = authz
        .has_access("listDirectory", &["/vo", ""], &user("alice", "vo_user"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn test_global_read_access() {
    let harness = TestHarness::new();
    let config = AuthorizerConfig {
        global_read_access: true,
        ..AuthorizerConfig::default()
    };
    let authz = harness.authorizer(&config).await;
    let eve = user("eve", "outsiders");

    let read = authz
        .has_access("getFileMetadata", &["/eiscat/2024/scan.dat"], &eve)
        .await
        .unwrap();
    assert_eq!(read.successful().get("/eiscat/2024/scan.dat"), Some(&true));

    let write = authz
        .has_access("removeFile", &["/vo/prod/run.dat"], &eve)
        .await
        .unwrap();
    assert_eq!(write.successful().get("/vo/prod/run.dat"), Some(&false));
}

#[tokio::test]
async fn test_add_file_checks_existing_parent() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let alice = authz
        .has_access("addFile", &["/vo/user/missing.txt"], &user("alice", "vo_user"))
        .await
        .unwrap();
    assert_eq!(alice.successful().get("/vo/user/missing.txt"), Some(&true));

    let eve = authz
        .has_access("addFile", &["/vo/user/missing.txt"], &user("eve", "outsiders"))
        .await
        .unwrap();
    assert_eq!(eve.successful().get("/vo/user/missing.txt"), Some(&false));
}

#[tokio::test]
async fn test_create_directory_deep_walks_to_ancestor() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let result = authz
        .has_access("createDirectory", &["/vo/user/a/b/c"], &user("bob", "vo_user"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/vo/user/a/b/c"), Some(&true));
}

#[tokio::test]
async fn test_remove_missing_is_allowed() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let eve = user("eve", "outsiders");

    for op in ["removeFile", "removeDirectory"] {
        let result = authz.has_access(op, &["/vo/gone"], &eve).await.unwrap();
        assert_eq!(result.successful().get("/vo/gone"), Some(&true), "{op}");
    }
}

#[tokio::test]
async fn test_root_bootstrap() {
    let harness = TestHarness::new();
    harness.catalog.remove("/", warden_core::EntryKind::Directory);
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let perms = authz
        .path_permissions(&["/"], &user("eve", "outsiders"))
        .await
        .unwrap();
    // a missing root is resolved before the file lookup gives up
    assert_eq!(perms.successful().get("/"), Some(&PermissionBits::ALL));

    let result = authz
        .has_access("createDirectory", &["/top"], &user("eve", "outsiders"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/top"), Some(&true));
}

#[tokio::test]
async fn test_owner_change_is_denied() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let alice = user("alice", "vo_user");

    for op in ["changePathOwner", "changePathGroup", "setFileOwner", "setFileGroup"] {
        let result = authz
            .has_access(op, &["/vo/user/data.root"], &alice)
            .await
            .unwrap();
        assert_eq!(result.successful().get("/vo/user/data.root"), Some(&false), "{op}");
    }
}

#[tokio::test]
async fn test_change_path_mode() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let alice = user("alice", "vo_user");

    let result = authz
        .has_access(
            "changePathMode",
            &["/vo/user/data.root", "/vo/prod", "/vo/unknown"],
            &alice,
        )
        .await
        .unwrap();
    assert_eq!(result.successful().get("/vo/user/data.root"), Some(&true));
    assert_eq!(result.successful().get("/vo/prod"), Some(&false));
    assert_eq!(result.successful().get("/vo/unknown"), Some(&true));
}

#[tokio::test]
async fn test_backend_fault_only_fails_its_path() {
    let harness = TestHarness::new();
    harness.catalog.fail_path("/vo/user/data.root");
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let result = authz
        .has_access(
            "getReplicas",
            &["/vo/user/data.root", "/vo/prod/run.dat"],
            &user("alice", "vo_user"),
        )
        .await
        .unwrap();
    assert!(result.failed()["/vo/user/data.root"].contains("injected fault"));
    assert_eq!(result.successful().get("/vo/prod/run.dat"), Some(&true));
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_duplicate_paths_collapse() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let result = authz
        .has_access(
            "listDirectory",
            &["/vo", "/vo", "/vo/user"],
            &user("alice", "vo_user"),
        )
        .await
        .unwrap();
    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn test_path_permissions_for_unknown_kind() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let bob = user("bob", "vo_prod");

    let result = authz
        .path_permissions(&["/vo/prod/run.dat", "/vo/user", "/vo/nothing"], &bob)
        .await
        .unwrap();
    let file = result.successful()["/vo/prod/run.dat"];
    assert!(file.read && !file.write);
    let dir = result.successful()["/vo/user"];
    assert!(dir.read && !dir.write && dir.execute);
    assert!(result.failed().contains_key("/vo/nothing"));
}

#[tokio::test]
async fn test_remove_file_isolates_backend_fault() {
    let harness = TestHarness::new();
    harness.catalog.fail_path("/vo/user/data.root");
    let authz = harness.authorizer_with(PolicyKind::Posix).await;

    let result = authz
        .has_access(
            "removeFile",
            &["/vo/user/data.root", "/vo/prod/run.dat", "/vo/gone"],
            &user("prod", "vo_prod"),
        )
        .await
        .unwrap();
    assert!(result.failed()["/vo/user/data.root"].contains("injected fault"));
    assert_eq!(result.failed().len(), 1);
    assert_eq!(result.successful().get("/vo/prod/run.dat"), Some(&true));
    assert_eq!(result.successful().get("/vo/gone"), Some(&true));
}

#[tokio::test]
async fn test_parsed_operation_matches_wire_name() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Posix).await;
    let eve = user("eve", "outsiders");
    let paths = ["/vo/prod/new.dat", "/vo/user/new.root"];

    let parsed = authz
        .has_access_for(Operation::AddFile, &paths, &eve)
        .await
        .unwrap();
    let named = authz.has_access("addFile", &paths, &eve).await.unwrap();
    assert_eq!(parsed, named);
    assert_eq!(parsed.successful().get("/vo/prod/new.dat"), Some(&false));
}
