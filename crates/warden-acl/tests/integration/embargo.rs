//! The embargo policy wired through the authorizer.

use chrono::Duration;
use warden_acl::{AuthorizerConfig, EmbargoConfig, PolicyKind};
use warden_core::{EntryKind, Error};

use crate::common::{TestHarness, user};

#[tokio::test]
async fn test_lapsed_embargo_opens_to_any_group() {
    let harness = TestHarness::new();
    let posix = harness.authorizer_with(PolicyKind::Posix).await;
    let embargo = harness.authorizer_with(PolicyKind::Embargo).await;
    let eve = user("eve", "outsiders");

    let denied = posix.has_access("listDirectory", &["/eiscat/2019"], &eve).await.unwrap();
    assert_eq!(denied.successful().get("/eiscat/2019"), Some(&false));

    let granted = embargo.has_access("listDirectory", &["/eiscat/2019"], &eve).await.unwrap();
    assert_eq!(granted.successful().get("/eiscat/2019"), Some(&true));
}

#[tokio::test]
async fn test_running_embargo_matches_country_and_account() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;
    let path = "/eiscat/2024/scan.dat";

    // NI is remapped to JP
    let jp = authz
        .has_access("getFileMetadata", &[path], &user("aki", "eiscat_JP"))
        .await
        .unwrap();
    assert_eq!(jp.successful().get(path), Some(&true));

    // account SW adds SE
    let se = authz
        .has_access("getFileMetadata", &[path], &user("erik", "eiscat_SE"))
        .await
        .unwrap();
    assert_eq!(se.successful().get(path), Some(&true));

    let fi = authz
        .has_access("getFileMetadata", &[path], &user("ilkka", "eiscat_FI"))
        .await
        .unwrap();
    assert_eq!(fi.successful().get(path), Some(&false));
}

#[tokio::test]
async fn test_file_inherits_directory_metadata() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;
    let path = "/eiscat/2024/scan.dat";

    let jp = authz
        .has_access("getReplicas", &[path], &user("aki", "eiscat_JP"))
        .await
        .unwrap();
    assert_eq!(jp.successful().get(path), Some(&true));

    let fi = authz
        .has_access("getReplicas", &[path], &user("ilkka", "eiscat_FI"))
        .await
        .unwrap();
    assert_eq!(fi.successful().get(path), Some(&false));
}

#[tokio::test]
async fn test_embargo_lapses_as_clock_advances() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;
    let fi = user("ilkka", "eiscat_FI");

    let before = authz.has_access("listDirectory", &["/eiscat/2024"], &fi).await.unwrap();
    assert_eq!(before.successful().get("/eiscat/2024"), Some(&false));

    harness.clock.advance(Duration::days(31 * 12));
    let after = authz.has_access("listDirectory", &["/eiscat/2024"], &fi).await.unwrap();
    assert_eq!(after.successful().get("/eiscat/2024"), Some(&true));
}

#[tokio::test]
async fn test_common_country_is_public() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_metadata("/eiscat/2024", EntryKind::Directory, "country", "CP")
        .unwrap();
    harness
        .catalog
        .set_metadata("/eiscat/2024", EntryKind::Directory, "account", "None")
        .unwrap();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;

    let result = authz
        .has_access("listDirectory", &["/eiscat/2024"], &user("ilkka", "eiscat_FI"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/eiscat/2024"), Some(&true));
}

#[tokio::test]
async fn test_untagged_group_falls_back_to_posix() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;

    let result = authz
        .has_access("listDirectory", &["/eiscat/2024"], &user("eve", "outsiders"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/eiscat/2024"), Some(&false));
}

#[tokio::test]
async fn test_bad_start_fails_only_that_path() {
    let harness = TestHarness::new();
    harness
        .catalog
        .set_metadata("/eiscat/2024", EntryKind::Directory, "start", "March 2024")
        .unwrap();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;

    let result = authz
        .has_access(
            "listDirectory",
            &["/eiscat/2024", "/eiscat/2019"],
            &user("aki", "eiscat_JP"),
        )
        .await
        .unwrap();
    assert!(result.failed()["/eiscat/2024"].contains("Invalid metadata"));
    assert_eq!(result.successful().get("/eiscat/2019"), Some(&true));
}

#[tokio::test]
async fn test_custom_lapse() {
    let harness = TestHarness::new();
    let config = AuthorizerConfig {
        policy: PolicyKind::Embargo,
        embargo: EmbargoConfig {
            lapse_months: 2,
            ..EmbargoConfig::default()
        },
        ..AuthorizerConfig::default()
    };
    let authz = harness.authorizer(&config).await;

    let result = authz
        .has_access("listDirectory", &["/eiscat/2024"], &user("eve", "outsiders"))
        .await
        .unwrap();
    assert_eq!(result.successful().get("/eiscat/2024"), Some(&true));
}

#[tokio::test]
async fn test_invalid_embargo_config_is_rejected() {
    let harness = TestHarness::new();
    let config = AuthorizerConfig {
        policy: PolicyKind::Embargo,
        embargo: EmbargoConfig {
            group_prefix: String::new(),
            ..EmbargoConfig::default()
        },
        ..AuthorizerConfig::default()
    };
    let err = warden_acl::Authorizer::from_config(&config, harness.collaborators())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_lapse_boundary_one_year_one_month() {
    let harness = TestHarness::new();
    let authz = harness.authorizer_with(PolicyKind::Embargo).await;
    let eve = user("eve", "outsiders");
    let path = "/eiscat/2024";

    // now is 2024-06-01 12:00:00, so the cutoff is 2023-05-01 12:00:00
    for (start, lapsed) in [
        ("2023-05-01/11:59:59", true),
        ("2023-05-01/12:00:01", false),
    ] {
        harness
            .catalog
            .set_metadata(path, EntryKind::Directory, "start", start)
            .unwrap();
        let result = authz.has_access("listDirectory", &[path], &eve).await.unwrap();
        assert_eq!(result.successful().get(path), Some(&lapsed), "{start}");
    }
}
