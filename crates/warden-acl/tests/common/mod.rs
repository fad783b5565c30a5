//! Shared fixture for the warden-acl integration tests.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use warden_acl::{Authorizer, AuthorizerConfig, Collaborators, PolicyKind};
use warden_core::{EntryKind, Identity, ManualClock};
use warden_storage::MemoryCatalog;

/// Test harness around an in-memory catalog and a pinned clock.
///
/// Layout:
///
/// ```text
/// /                           root:admin         755
/// /vo                         root:vo_prod       775
/// /vo/user                    alice:vo_user      775
/// /vo/user/data.root          alice:vo_user      664
/// /vo/prod                    prod:vo_prod       775
/// /vo/prod/run.dat            prod:vo_prod       644
/// /eiscat                     root:eiscat_files  755
/// /eiscat/2019                root:eiscat_files  750  start 2019, lapsed
/// /eiscat/2024                root:eiscat_files  750  start 2024-03, NI / SW
/// /eiscat/2024/scan.dat       root:eiscat_files  640
/// ```
pub struct TestHarness {
    /// The catalog, shared with the authorizer.
    pub catalog: Arc<MemoryCatalog>,
    /// The clock, shared with the authorizer.
    pub clock: Arc<ManualClock>,
}

impl TestHarness {
    /// Creates the harness with the standard layout.
    pub fn new() -> Self {
        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add_directory("/", "root", "admin", 0o755);
        catalog.add_directory("/vo", "root", "vo_prod", 0o775);
        catalog.add_directory("/vo/user", "alice", "vo_user", 0o775);
        catalog.add_file("/vo/user/data.root", "alice", "vo_user", 0o664);
        catalog.add_directory("/vo/prod", "prod", "vo_prod", 0o775);
        catalog.add_file("/vo/prod/run.dat", "prod", "vo_prod", 0o644);

        catalog.add_directory("/eiscat", "root", "eiscat_files", 0o755);
        catalog.add_directory("/eiscat/2019", "root", "eiscat_files", 0o750);
        catalog.add_directory("/eiscat/2024", "root", "eiscat_files", 0o750);
        catalog.add_file("/eiscat/2024/scan.dat", "root", "eiscat_files", 0o640);
        let dir = EntryKind::Directory;
        for (path, key, value) in [
            ("/eiscat/2019", "start", "2019-02-11/10:00:00"),
            ("/eiscat/2019", "country", "FI"),
            ("/eiscat/2024", "start", "2024-03-01/00:00:00"),
            ("/eiscat/2024", "country", "NI"),
            ("/eiscat/2024", "account", "SW"),
        ] {
            catalog.set_metadata(path, dir, key, value).unwrap();
        }

        catalog.add_group("vo_user", Some("/vo"));
        catalog.add_group("vo_prod", Some("/vo"));
        catalog.add_group("outsiders", None);
        catalog.add_group("eiscat_files", None);
        for tag in ["JP", "SE", "FI"] {
            catalog.add_group(&format!("eiscat_{tag}"), None);
        }

        Self {
            catalog,
            clock: Arc::new(ManualClock::new(now())),
        }
    }

    /// Collaborators backed by the harness catalog and clock.
    pub fn collaborators(&self) -> Collaborators {
        Collaborators::from_backend(self.catalog.clone()).with_clock(self.clock.clone())
    }

    /// Builds an authorizer from `config`.
    pub async fn authorizer(&self, config: &AuthorizerConfig) -> Authorizer {
        Authorizer::from_config(config, self.collaborators())
            .await
            .unwrap()
    }

    /// Builds an authorizer running `policy` with otherwise default settings.
    pub async fn authorizer_with(&self, policy: PolicyKind) -> Authorizer {
        let config = AuthorizerConfig {
            policy,
            ..AuthorizerConfig::default()
        };
        self.authorizer(&config).await
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// The instant the harness clock starts at.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// A plain caller.
pub fn user(name: &str, group: &str) -> Identity {
    Identity::new(name, group)
}
