//! Catalog namespace nodes and path helpers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The namespace root.
pub const ROOT: &str = "/";

/// Free-form user metadata attached to a catalog entry.
pub type MetadataBag = BTreeMap<String, String>;

/// Kind of a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file (leaf).
    File,
    /// A directory.
    Directory,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// One node of the catalog, as returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Absolute catalog path.
    pub path: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Group that owns the entry.
    pub owner_group: String,
    /// Domain metadata, when the backend supplies it inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataBag>,
}

impl PathEntry {
    /// Creates an entry without inline metadata.
    pub fn new(path: impl Into<String>, kind: EntryKind, owner_group: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            owner_group: owner_group.into(),
            metadata: None,
        }
    }

    /// Attaches inline metadata.
    pub fn with_metadata(mut self, metadata: MetadataBag) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Returns `true` for directories.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Returns the parent of a catalog path.
///
/// Trailing slashes are ignored. The parent of a top-level entry and of the
/// root itself is `/`; a relative path without any slash has the empty
/// string as parent.
///
/// # Examples
///
/// ```
/// use warden_core::path::parent_path;
///
/// assert_eq!(parent_path("/vo/user/file.dat"), "/vo/user");
/// assert_eq!(parent_path("/vo/"), "/");
/// assert_eq!(parent_path("/vo"), "/");
/// assert_eq!(parent_path("/"), "/");
/// assert_eq!(parent_path("file.dat"), "");
/// ```
pub fn parent_path(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return if path.starts_with('/') { ROOT } else { "" };
    }
    match trimmed.rfind('/') {
        Some(0) => ROOT,
        Some(idx) => &trimmed[..idx],
        None => "",
    }
}

/// Returns `true` if `path` designates the namespace root.
pub fn is_root(path: &str) -> bool {
    !path.is_empty() && path.trim_end_matches('/').is_empty()
}
