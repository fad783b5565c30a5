//! Collaborator traits consumed by the authorization engine.
//!
//! The engine owns none of the namespace data. It reaches it through three
//! async traits, each held as `Arc<dyn …>`:
//!
//! - [`CatalogStore`]: directory tree and file metadata, POSIX bit evaluation
//! - [`GroupDirectory`]: group → role assignments from identity management
//! - [`MetadataSource`]: free-form user metadata used by domain policies
//!
//! Implementations are expected to report a missing entry as
//! [`Error::NotFound`](crate::Error::NotFound) and every other failure as
//! [`Error::Backend`](crate::Error::Backend). Retries belong to the
//! implementation, not to the engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::bulk::BulkResult;
use crate::error::Result;
use crate::identity::Identity;
use crate::path::{EntryKind, MetadataBag, PathEntry};
use crate::permission::PermissionBits;

/// Directory tree and file-metadata storage.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks up a file's ownership metadata.
    async fn file_metadata(&self, path: &str) -> Result<PathEntry>;

    /// Looks up a directory's ownership parameters.
    async fn directory_parameters(&self, path: &str) -> Result<PathEntry>;

    /// Computes the POSIX bits of an existing file for `identity`.
    async fn file_permissions(&self, path: &str, identity: &Identity) -> Result<PermissionBits>;

    /// Computes the POSIX bits of an existing directory for `identity`.
    async fn directory_permissions(
        &self,
        path: &str,
        identity: &Identity,
    ) -> Result<PermissionBits>;

    /// Reports, for each path, whether an entry of `kind` exists.
    ///
    /// A lookup that fails for one path lands in that path's
    /// [`BulkResult::failed`] entry. `Err` means the batch as a whole could
    /// not be checked.
    async fn exists(&self, kind: EntryKind, paths: &[String]) -> Result<BulkResult<bool>>;

    /// Looks up a path of known kind.
    async fn entry(&self, path: &str, kind: EntryKind) -> Result<PathEntry> {
        match kind {
            EntryKind::File => self.file_metadata(path).await,
            EntryKind::Directory => self.directory_parameters(path).await,
        }
    }

    /// Computes POSIX bits for a path of known kind.
    async fn permissions(
        &self,
        path: &str,
        kind: EntryKind,
        identity: &Identity,
    ) -> Result<PermissionBits> {
        match kind {
            EntryKind::File => self.file_permissions(path, identity).await,
            EntryKind::Directory => self.directory_permissions(path, identity).await,
        }
    }
}

/// One group as registered in identity management.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRecord {
    /// Group name.
    pub group: String,
    /// External role attribute, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl GroupRecord {
    /// Creates a record for a group with a role.
    pub fn new(group: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            role: Some(role.into()),
        }
    }

    /// Creates a record for a group without a role.
    pub fn without_role(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            role: None,
        }
    }
}

/// Identity-management collaborator.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    /// Lists every known group with its role attribute.
    async fn list_groups(&self) -> Result<Vec<GroupRecord>>;
}

/// Domain-metadata collaborator.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// User metadata attached to a file.
    async fn file_user_metadata(&self, path: &str) -> Result<MetadataBag>;

    /// User metadata attached to a directory.
    async fn directory_user_metadata(&self, path: &str) -> Result<MetadataBag>;
}
