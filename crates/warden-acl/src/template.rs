//! Bulk permission templates.
//!
//! A template is one way of turning a set of paths into a
//! [`BulkResult<bool>`]: which entry is looked up (the path itself or its
//! parent), as which kind, with which [`Lookup`], and which
//! [`Permission`] bit decides. Paths fail independently; a whole-call error
//! is never produced here.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use warden_core::path::parent_path;
use warden_core::{BulkResult, EntryKind, Identity, MissingStrategy, Permission, Result};

use crate::resolver::{Lookup, PermissionResolver};

/// The fixed set of permission templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyTemplate {
    /// Missing directories are allowed; existing ones need Write on the parent.
    RemoveDirectory,
    /// Missing files are allowed; existing ones need Write on the parent.
    RemoveFile,
    /// Write on the parent directory, walking upward.
    WriteForFileOrDirectory,
    /// Read on the parent directory, walking upward.
    ReadForFileOrDirectory,
    /// Write on the file itself; a missing file is allowed.
    ///
    /// Replica writes share this template.
    WriteOnFile,
    /// Read on the file itself; a missing file is allowed.
    ReadForReplica,
    /// Read on the directory itself, walking upward.
    ListDirectory,
    /// Write on the path of either kind; a missing path is allowed.
    ChangePathMode,
    /// Always `false`.
    Deny,
}

impl PolicyTemplate {
    /// Every template.
    pub const ALL: [PolicyTemplate; 9] = [
        Self::RemoveDirectory,
        Self::RemoveFile,
        Self::WriteForFileOrDirectory,
        Self::ReadForFileOrDirectory,
        Self::WriteOnFile,
        Self::ReadForReplica,
        Self::ListDirectory,
        Self::ChangePathMode,
        Self::Deny,
    ];

    /// Template name, used in logs and by the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::RemoveDirectory => "RemoveDirectory",
            Self::RemoveFile => "RemoveFile",
            Self::WriteForFileOrDirectory => "WriteForFileOrDirectory",
            Self::ReadForFileOrDirectory => "ReadForFileOrDirectory",
            Self::WriteOnFile => "WriteOnFile",
            Self::ReadForReplica => "ReadForReplica",
            Self::ListDirectory => "ListDirectory",
            Self::ChangePathMode => "ChangePathMode",
            Self::Deny => "Deny",
        }
    }

    /// Evaluates the template for every path.
    ///
    /// `paths` are expected to be non-empty and deduplicated.
    pub async fn evaluate(
        self,
        resolver: &PermissionResolver,
        paths: &BTreeSet<String>,
        identity: &Identity,
    ) -> BulkResult<bool> {
        log::debug!(
            "{} over {} path(s) for {}",
            self.name(),
            paths.len(),
            identity
        );
        match self {
            Self::RemoveDirectory => {
                removal(resolver, paths, identity, EntryKind::Directory).await
            }
            Self::RemoveFile => removal(resolver, paths, identity, EntryKind::File).await,
            Self::WriteForFileOrDirectory => {
                on_parents(resolver, paths, identity, Permission::Write).await
            }
            Self::ReadForFileOrDirectory => {
                on_parents(resolver, paths, identity, Permission::Read).await
            }
            Self::WriteOnFile => on_files(resolver, paths, identity, Permission::Write).await,
            Self::ReadForReplica => on_files(resolver, paths, identity, Permission::Read).await,
            Self::ListDirectory => {
                BulkResult::evaluate(paths.iter().cloned(), |path| async move {
                    check(
                        resolver
                            .resolve(&path, EntryKind::Directory, identity, Lookup::recursive())
                            .await,
                        Permission::Read,
                    )
                })
                .await
            }
            Self::ChangePathMode => {
                BulkResult::evaluate(paths.iter().cloned(), |path| async move {
                    check(
                        resolver
                            .resolve_any(&path, identity, Lookup::exact(MissingStrategy::Allow))
                            .await,
                        Permission::Write,
                    )
                })
                .await
            }
            Self::Deny => BulkResult::uniform(paths.iter().cloned(), false),
        }
    }
}

impl fmt::Display for PolicyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn check(bits: Result<warden_core::PermissionBits>, permission: Permission) -> Result<bool> {
    bits.map(|bits| bits.get(permission))
}

/// Tests `permission` on the file itself, allowing missing files.
async fn on_files(
    resolver: &PermissionResolver,
    paths: &BTreeSet<String>,
    identity: &Identity,
    permission: Permission,
) -> BulkResult<bool> {
    BulkResult::evaluate(paths.iter().cloned(), |path| async move {
        check(
            resolver
                .resolve(
                    &path,
                    EntryKind::File,
                    identity,
                    Lookup::exact(MissingStrategy::Allow),
                )
                .await,
            permission,
        )
    })
    .await
}

/// Tests `permission` on the parent of every path.
///
/// Each distinct parent is resolved once and its outcome is copied to every
/// child, failures included.
async fn on_parents<'a, I>(
    resolver: &PermissionResolver,
    paths: I,
    identity: &Identity,
    permission: Permission,
) -> BulkResult<bool>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut children: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in paths {
        children
            .entry(parent_path(path).to_string())
            .or_default()
            .push(path.clone());
    }

    let parents = BulkResult::evaluate(children.keys().cloned(), |parent| async move {
        check(
            resolver
                .resolve(&parent, EntryKind::Directory, identity, Lookup::recursive())
                .await,
            permission,
        )
    })
    .await;

    let mut result = BulkResult::new();
    for (parent, kids) in children {
        let outcome = match (parents.successful().get(&parent), parents.failed().get(&parent)) {
            (Some(allowed), _) => Ok(*allowed),
            (None, Some(message)) => Err(message.clone()),
            (None, None) => Err(format!("no decision for parent {parent}")),
        };
        for kid in kids {
            match &outcome {
                Ok(allowed) => result.insert_ok(kid, *allowed),
                Err(message) => result.insert_err(kid, message.clone()),
            }
        }
    }
    result
}

/// Removal: absent paths are allowed, present ones need Write on the parent.
///
/// A path whose existence check failed keeps that failure.
async fn removal(
    resolver: &PermissionResolver,
    paths: &BTreeSet<String>,
    identity: &Identity,
    kind: EntryKind,
) -> BulkResult<bool> {
    let requested: Vec<String> = paths.iter().cloned().collect();
    let found = match resolver.store().exists(kind, &requested).await {
        Ok(found) => found,
        Err(err) => {
            log::warn!("Existence check for {} {kind} path(s) failed: {err}", requested.len());
            return BulkResult::fail_all(requested, &err.to_string());
        }
    };

    let mut result = BulkResult::new();
    let mut present = Vec::new();
    for path in &requested {
        match (found.successful().get(path).copied(), found.failed().get(path)) {
            (Some(true), _) => present.push(path),
            (Some(false), _) => result.insert_ok(path.clone(), true),
            (None, Some(message)) => result.insert_err(path.clone(), message.clone()),
            (None, None) => {
                result.insert_err(path.clone(), format!("no existence result for {path}"))
            }
        }
    }
    result.merge(on_parents(resolver, present, identity, Permission::Write).await);
    result
}
