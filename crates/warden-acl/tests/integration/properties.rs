//! Property tests over random operations, path sets and callers.

use std::collections::BTreeSet;

use proptest::prelude::*;
use warden_acl::{Operation, PolicyKind};
use warden_core::Identity;

use crate::common::TestHarness;

const PATHS: &[&str] = &[
    "/",
    "/vo",
    "/vo/user",
    "/vo/user/data.root",
    "/vo/user/new.txt",
    "/vo/prod",
    "/vo/prod/run.dat",
    "/vo/prod/deep/missing",
    "/eiscat/2019",
    "/eiscat/2024",
    "/eiscat/2024/scan.dat",
    "/nowhere/at/all",
];

const GROUPS: &[&str] = &["vo_user", "vo_prod", "outsiders", "eiscat_JP", "eiscat_FI"];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn policy() -> impl Strategy<Value = PolicyKind> {
    prop::sample::select(PolicyKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_every_path_lands_in_exactly_one_partition(
        op in prop::sample::select(Operation::ALL.to_vec()),
        paths in prop::collection::vec(prop::sample::select(PATHS.to_vec()), 1..8),
        group in prop::sample::select(GROUPS.to_vec()),
        faulty in prop::option::of(prop::sample::select(PATHS.to_vec())),
        kind in policy(),
    ) {
        runtime().block_on(async {
            let harness = TestHarness::new();
            if let Some(path) = faulty {
                harness.catalog.fail_path(path);
            }
            let authz = harness.authorizer_with(kind).await;
            let identity = Identity::new("prop", group);

            let result = authz.has_access(op.name(), &paths, &identity).await.unwrap();

            let requested: BTreeSet<&str> = paths.iter().copied().collect();
            assert_eq!(result.len(), requested.len());
            assert_eq!(result.paths(), requested);
            for path in result.successful().keys() {
                assert!(!result.failed().contains_key(path));
            }
        });
    }

    #[test]
    fn test_repeated_calls_agree(
        op in prop::sample::select(Operation::ALL.to_vec()),
        paths in prop::collection::vec(prop::sample::select(PATHS.to_vec()), 1..6),
        group in prop::sample::select(GROUPS.to_vec()),
        kind in policy(),
    ) {
        runtime().block_on(async {
            let harness = TestHarness::new();
            let authz = harness.authorizer_with(kind).await;
            let identity = Identity::new("prop", group);

            let first = authz.has_access(op.name(), &paths, &identity).await.unwrap();
            let second = authz.has_access(op.name(), &paths, &identity).await.unwrap();
            assert_eq!(first, second);
        });
    }

    #[test]
    fn test_admin_always_allowed(
        op in prop::sample::select(Operation::ALL.to_vec()),
        paths in prop::collection::vec(prop::sample::select(PATHS.to_vec()), 1..6),
    ) {
        runtime().block_on(async {
            let harness = TestHarness::new();
            let authz = harness.authorizer_with(PolicyKind::Posix).await;
            let admin = Identity::new("root", "outsiders")
                .with_capability(warden_core::Capability::FileCatalogManagement);

            let result = authz.has_access(op.name(), &paths, &admin).await.unwrap();
            assert!(result.failed().is_empty());
            assert!(result.successful().values().all(|allowed| *allowed));
        });
    }
}
