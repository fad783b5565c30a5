//! Hierarchical permission resolution.
//!
//! [`PermissionResolver`] turns `(path, identity)` into [`PermissionBits`].
//! It walks towards the root when asked to, lets the active
//! [`PolicyPlugin`] choose the identity for each existing entry, and applies
//! a [`MissingStrategy`] when an exact lookup comes back empty.

use std::fmt;
use std::sync::Arc;

use warden_core::path::{is_root, parent_path};
use warden_core::{
    CatalogStore, EntryKind, Error, Identity, MissingStrategy, PermissionBits, Result,
};

use crate::policy::PolicyPlugin;

/// How a lookup deals with entries that do not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Lookup {
    /// Walk to the parent directory when the path is missing.
    pub recursive: bool,
    /// Outcome of a missing path when `recursive` is off.
    pub on_missing: MissingStrategy,
}

impl Lookup {
    /// Walks upward to the nearest existing ancestor.
    pub const fn recursive() -> Self {
        Self {
            recursive: true,
            on_missing: MissingStrategy::PropagateError,
        }
    }

    /// Looks at the path only; a missing path resolves through `on_missing`.
    pub const fn exact(on_missing: MissingStrategy) -> Self {
        Self {
            recursive: false,
            on_missing,
        }
    }
}

/// Resolves POSIX bits for catalog paths.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn CatalogStore>,
    policy: Arc<dyn PolicyPlugin>,
}

impl PermissionResolver {
    /// Creates a resolver over `store` using `policy`.
    pub fn new(store: Arc<dyn CatalogStore>, policy: Arc<dyn PolicyPlugin>) -> Self {
        Self { store, policy }
    }

    /// The storage collaborator.
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    /// The active policy.
    pub fn policy(&self) -> &Arc<dyn PolicyPlugin> {
        &self.policy
    }

    /// Resolves the bits of `path`, looked up as `kind`.
    ///
    /// A missing `/` always yields every bit. With [`Lookup::recursive`] a
    /// missing path is retried as the parent directory until an existing
    /// ancestor is found.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] for an empty path
    /// - [`Error::NotFound`] when the path is missing and the lookup
    ///   propagates
    /// - whatever the store or the policy report
    pub async fn resolve(
        &self,
        path: &str,
        kind: EntryKind,
        identity: &Identity,
        lookup: Lookup,
    ) -> Result<PermissionBits> {
        if path.is_empty() {
            return Err(Error::invalid_input("path must not be empty"));
        }

        let mut current = path;
        let mut kind = kind;
        loop {
            match self.store.entry(current, kind).await {
                Ok(entry) => {
                    let effective = self.policy.effective_identity(&entry, identity).await?;
                    return self.store.permissions(current, kind, &effective).await;
                }
                Err(err) if err.is_not_found() => {
                    if is_root(current) {
                        log::debug!("Root missing, granting bootstrap bits on {path}");
                        return Ok(PermissionBits::ALL);
                    }
                    if !lookup.recursive {
                        return lookup.on_missing.resolve(err);
                    }
                    let parent = parent_path(current);
                    if parent.is_empty() {
                        return Err(err);
                    }
                    log::trace!("{current} not found, trying {parent}");
                    current = parent;
                    kind = EntryKind::Directory;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Resolves a path of unknown kind.
    ///
    /// The path is tried as a file first. When no such file exists it is
    /// resolved as a directory with `lookup`.
    pub async fn resolve_any(
        &self,
        path: &str,
        identity: &Identity,
        lookup: Lookup,
    ) -> Result<PermissionBits> {
        let as_file = self
            .resolve(
                path,
                EntryKind::File,
                identity,
                Lookup::exact(MissingStrategy::PropagateError),
            )
            .await;
        match as_file {
            Err(err) if err.is_not_found() => {
                self.resolve(path, EntryKind::Directory, identity, lookup)
                    .await
            }
            other => other,
        }
    }
}

impl fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}
