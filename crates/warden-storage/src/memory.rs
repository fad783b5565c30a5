//! In-memory catalog backend.
//!
//! [`MemoryCatalog`] implements every collaborator trait the engine
//! consumes: the directory tree and file table ([`CatalogStore`]), the group
//! registry ([`GroupDirectory`]) and user metadata ([`MetadataSource`]).
//! Permission bits follow plain POSIX semantics on an octal `mode`.
//!
//! It is used by the CLI (loaded from a JSON fixture) and by tests, which can
//! inject per-path backend faults with [`MemoryCatalog::fail_path`].
//!
//! # Fixture format
//!
//! ```json
//! {
//!   "directories": {
//!     "/vo": { "owner": "admin", "owner_group": "vo_admin", "mode": "755" }
//!   },
//!   "files": {
//!     "/vo/data.raw": {
//!       "owner": "alice", "owner_group": "vo_user", "mode": "640",
//!       "metadata": { "start": "2020-01-01/00:00:00" }
//!     }
//!   },
//!   "groups": [ { "group": "vo_user", "role": "/vo/Role=user" } ]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::path::is_root;
use warden_core::{
    BulkResult, CatalogStore, EntryKind, Error, GroupDirectory, GroupRecord, Identity,
    MetadataBag, MetadataSource, PathEntry, PermissionBits, Result,
};

/// Default mode for entries created without an explicit one.
pub const DEFAULT_MODE: u32 = 0o775;

/// One stored catalog node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Owning user.
    pub owner: String,
    /// Owning group.
    pub owner_group: String,
    /// POSIX mode, written as an octal string in fixtures.
    #[serde(with = "octal_mode", default = "default_mode")]
    pub mode: u32,
    /// User metadata.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: MetadataBag,
}

impl NodeSpec {
    /// Creates a node without metadata.
    pub fn new(owner: impl Into<String>, owner_group: impl Into<String>, mode: u32) -> Self {
        Self {
            owner: owner.into(),
            owner_group: owner_group.into(),
            mode,
            metadata: MetadataBag::new(),
        }
    }

    /// POSIX bits granted to `identity` by this node's mode.
    pub fn bits_for(&self, identity: &Identity) -> PermissionBits {
        let triplet = if identity.username() == self.owner {
            self.mode >> 6
        } else if identity.group() == self.owner_group {
            self.mode >> 3
        } else {
            self.mode
        };
        PermissionBits::from_triplet(triplet & 0o7)
    }
}

fn default_mode() -> u32 {
    DEFAULT_MODE
}

mod octal_mode {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(mode: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{mode:o}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let digits = raw.trim_start_matches("0o");
        u32::from_str_radix(digits, 8)
            .map_err(|e| serde::de::Error::custom(format!("invalid octal mode '{raw}': {e}")))
    }
}

/// Serializable snapshot of a whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFixture {
    /// Directories keyed by path.
    #[serde(default)]
    pub directories: BTreeMap<String, NodeSpec>,
    /// Files keyed by path.
    #[serde(default)]
    pub files: BTreeMap<String, NodeSpec>,
    /// Registered groups and their roles.
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
}

impl CatalogFixture {
    /// Reads a fixture from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[derive(Default)]
struct CatalogState {
    directories: BTreeMap<String, NodeSpec>,
    files: BTreeMap<String, NodeSpec>,
    groups: BTreeMap<String, Option<String>>,
    faults: BTreeSet<String>,
    fail_group_listing: bool,
    fail_existence_checks: bool,
}

impl CatalogState {
    fn table(&self, kind: EntryKind) -> &BTreeMap<String, NodeSpec> {
        match kind {
            EntryKind::File => &self.files,
            EntryKind::Directory => &self.directories,
        }
    }

    fn check_fault(&self, path: &str) -> Result<()> {
        if self.faults.contains(path) {
            return Err(Error::backend(format!("injected fault for {path}")));
        }
        Ok(())
    }

    fn node(&self, path: &str, kind: EntryKind) -> Result<&NodeSpec> {
        self.check_fault(path)?;
        self.table(kind)
            .get(path)
            .ok_or_else(|| Error::not_found(path))
    }
}

/// Thread-safe in-memory catalog.
#[derive(Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
    calls: AtomicUsize,
}

impl MemoryCatalog {
    /// Creates an empty catalog (not even `/` exists).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog populated from a fixture.
    pub fn from_fixture(fixture: CatalogFixture) -> Self {
        let catalog = Self::new();
        {
            let mut state = catalog.write();
            for (path, node) in fixture.directories {
                state.directories.insert(normalize(&path), node);
            }
            for (path, node) in fixture.files {
                state.files.insert(normalize(&path), node);
            }
            for record in fixture.groups {
                state.groups.insert(record.group, record.role);
            }
        }
        catalog
    }

    /// Creates a catalog from a JSON fixture file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let fixture = CatalogFixture::from_json_file(path)?;
        log::debug!(
            "Loaded catalog fixture {} ({} directories, {} files)",
            path.display(),
            fixture.directories.len(),
            fixture.files.len()
        );
        Ok(Self::from_fixture(fixture))
    }

    /// Adds or replaces a directory.
    pub fn add_directory(&self, path: &str, owner: &str, owner_group: &str, mode: u32) {
        self.write()
            .directories
            .insert(normalize(path), NodeSpec::new(owner, owner_group, mode));
    }

    /// Adds or replaces a file.
    pub fn add_file(&self, path: &str, owner: &str, owner_group: &str, mode: u32) {
        self.write()
            .files
            .insert(normalize(path), NodeSpec::new(owner, owner_group, mode));
    }

    /// Removes an entry of `kind`; returns `true` if it existed.
    pub fn remove(&self, path: &str, kind: EntryKind) -> bool {
        let mut state = self.write();
        let table = match kind {
            EntryKind::File => &mut state.files,
            EntryKind::Directory => &mut state.directories,
        };
        table.remove(&normalize(path)).is_some()
    }

    /// Sets one user-metadata key on an existing entry.
    pub fn set_metadata(&self, path: &str, kind: EntryKind, key: &str, value: &str) -> Result<()> {
        let mut state = self.write();
        let table = match kind {
            EntryKind::File => &mut state.files,
            EntryKind::Directory => &mut state.directories,
        };
        let node = table
            .get_mut(&normalize(path))
            .ok_or_else(|| Error::not_found(path))?;
        node.metadata.insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Registers a group, optionally with a role.
    pub fn add_group(&self, group: &str, role: Option<&str>) {
        self.write()
            .groups
            .insert(group.to_string(), role.map(str::to_string));
    }

    /// Makes every lookup of `path` fail with a backend error.
    pub fn fail_path(&self, path: &str) {
        self.write().faults.insert(normalize(path));
    }

    /// Makes group listing fail (or succeed again).
    pub fn fail_group_listing(&self, fail: bool) {
        self.write().fail_group_listing = fail;
    }

    /// Makes every batched existence check fail as a whole.
    pub fn fail_existence_checks(&self, fail: bool) {
        self.write().fail_existence_checks = fail;
    }

    /// Removes every injected fault.
    pub fn clear_faults(&self) {
        let mut state = self.write();
        state.faults.clear();
        state.fail_group_listing = false;
        state.fail_existence_checks = false;
    }

    /// Number of collaborator calls served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Exports the current contents as a fixture.
    pub fn to_fixture(&self) -> CatalogFixture {
        let state = self.read();
        CatalogFixture {
            directories: state.directories.clone(),
            files: state.files.clone(),
            groups: state
                .groups
                .iter()
                .map(|(group, role)| GroupRecord {
                    group: group.clone(),
                    role: role.clone(),
                })
                .collect(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn lookup(&self, path: &str, kind: EntryKind) -> Result<PathEntry> {
        self.tick();
        let path = normalize(path);
        let state = self.read();
        let node = state.node(&path, kind)?;
        Ok(PathEntry::new(path.clone(), kind, node.owner_group.clone()))
    }

    fn bits(&self, path: &str, kind: EntryKind, identity: &Identity) -> Result<PermissionBits> {
        self.tick();
        let path = normalize(path);
        let state = self.read();
        Ok(state.node(&path, kind)?.bits_for(identity))
    }

    fn user_metadata(&self, path: &str, kind: EntryKind) -> Result<MetadataBag> {
        self.tick();
        let path = normalize(path);
        let state = self.read();
        Ok(state.node(&path, kind)?.metadata.clone())
    }
}

/// Canonical key for a catalog path: no trailing slash except for `/`.
fn normalize(path: &str) -> String {
    if is_root(path) {
        "/".to_string()
    } else {
        path.trim_end_matches('/').to_string()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn file_metadata(&self, path: &str) -> Result<PathEntry> {
        self.lookup(path, EntryKind::File)
    }

    async fn directory_parameters(&self, path: &str) -> Result<PathEntry> {
        self.lookup(path, EntryKind::Directory)
    }

    async fn file_permissions(&self, path: &str, identity: &Identity) -> Result<PermissionBits> {
        self.bits(path, EntryKind::File, identity)
    }

    async fn directory_permissions(
        &self,
        path: &str,
        identity: &Identity,
    ) -> Result<PermissionBits> {
        self.bits(path, EntryKind::Directory, identity)
    }

    async fn exists(&self, kind: EntryKind, paths: &[String]) -> Result<BulkResult<bool>> {
        self.tick();
        let state = self.read();
        if state.fail_existence_checks {
            return Err(Error::backend("existence check unavailable"));
        }
        Ok(BulkResult::from_outcomes(paths.iter().map(|path| {
            let key = normalize(path);
            let outcome = state
                .check_fault(&key)
                .map(|()| state.table(kind).contains_key(&key));
            (path.clone(), outcome)
        })))
    }
}

#[async_trait]
impl GroupDirectory for MemoryCatalog {
    async fn list_groups(&self) -> Result<Vec<GroupRecord>> {
        self.tick();
        let state = self.read();
        if state.fail_group_listing {
            return Err(Error::backend("group registry unavailable"));
        }
        Ok(state
            .groups
            .iter()
            .map(|(group, role)| GroupRecord {
                group: group.clone(),
                role: role.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl MetadataSource for MemoryCatalog {
    async fn file_user_metadata(&self, path: &str) -> Result<MetadataBag> {
        self.user_metadata(path, EntryKind::File)
    }

    async fn directory_user_metadata(&self, path: &str) -> Result<MetadataBag> {
        self.user_metadata(path, EntryKind::Directory)
    }
}
