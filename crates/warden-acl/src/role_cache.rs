//! Group ↔ role cache with time-based invalidation.
//!
//! [`RoleCache`] maps a group to its external role attribute and back. The
//! maps live in an immutable [`RoleSnapshot`] that is published through a
//! `watch` channel: a rebuild constructs a complete new snapshot and swaps
//! it in with `send_replace`, so a reader holds either the old or the new
//! snapshot, never a mix.
//!
//! A snapshot expires once `now - built_at > ttl`; the first access after
//! that triggers a rebuild from the [`GroupDirectory`]. Concurrent accessors
//! that find a rebuild already running keep using the current snapshot.
//!
//! # Usage
//!
//! ```rust,ignore
//! let cache = RoleCache::load(directory, clock, DEFAULT_ROLE_CACHE_TTL).await?;
//! if cache.share_role("lhcb_user", "lhcb_prod").await {
//!     // evaluate as the owner group
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use warden_core::{Clock, Error, GroupDirectory, GroupRecord, Result};

/// Default snapshot lifetime.
pub const DEFAULT_ROLE_CACHE_TTL: Duration = Duration::from_secs(600);

// ============================================================================
// RoleSnapshot
// ============================================================================

/// Immutable group/role maps stamped with their build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSnapshot {
    group_to_role: BTreeMap<String, String>,
    role_to_groups: BTreeMap<String, BTreeSet<String>>,
    built_at: DateTime<Utc>,
}

impl RoleSnapshot {
    /// Builds both directions from a group listing.
    ///
    /// Groups without a role (or with an empty one) are left out.
    pub fn from_records<I>(records: I, built_at: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = GroupRecord>,
    {
        let mut group_to_role = BTreeMap::new();
        let mut role_to_groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for record in records {
            let Some(role) = record.role.filter(|r| !r.is_empty()) else {
                continue;
            };
            role_to_groups
                .entry(role.clone())
                .or_default()
                .insert(record.group.clone());
            group_to_role.insert(record.group, role);
        }

        Self {
            group_to_role,
            role_to_groups,
            built_at,
        }
    }

    /// Role of `group`, if it has one.
    pub fn role_of(&self, group: &str) -> Option<&str> {
        self.group_to_role.get(group).map(String::as_str)
    }

    /// Groups carrying `role`; empty when the role is unknown.
    pub fn groups_with_role(&self, role: &str) -> BTreeSet<String> {
        self.role_to_groups.get(role).cloned().unwrap_or_default()
    }

    /// Returns `true` if both groups carry the same non-empty role.
    pub fn share_role(&self, group: &str, other: &str) -> bool {
        match (self.role_of(group), self.role_of(other)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// When this snapshot was built.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Number of groups with a role.
    pub fn group_count(&self) -> usize {
        self.group_to_role.len()
    }

    /// Returns `true` once the snapshot is older than `ttl` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now - self.built_at > ttl
    }
}

// ============================================================================
// RoleCache
// ============================================================================

/// TTL-bounded, wholesale-rebuilt role cache.
pub struct RoleCache {
    directory: Arc<dyn GroupDirectory>,
    clock: Arc<dyn Clock>,
    ttl: chrono::Duration,
    tx: watch::Sender<Arc<RoleSnapshot>>,
    rebuilding: AtomicBool,
}

/// Clears the rebuild flag even if the rebuilding future is dropped.
struct RebuildGuard<'a>(&'a AtomicBool);

impl Drop for RebuildGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RoleCache {
    /// Builds the first snapshot and returns the cache.
    pub async fn load(
        directory: Arc<dyn GroupDirectory>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Result<Self> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::config(format!("role cache TTL out of range: {e}")))?;
        let snapshot = Self::fetch(directory.as_ref(), clock.as_ref()).await?;
        let (tx, _rx) = watch::channel(Arc::new(snapshot));
        Ok(Self {
            directory,
            clock,
            ttl,
            tx,
            rebuilding: AtomicBool::new(false),
        })
    }

    /// The snapshot currently published, without checking expiry.
    pub fn snapshot(&self) -> Arc<RoleSnapshot> {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    pub fn subscribe(&self) -> watch::Receiver<Arc<RoleSnapshot>> {
        self.tx.subscribe()
    }

    /// The current snapshot, rebuilt first if it has expired.
    pub async fn current(&self) -> Arc<RoleSnapshot> {
        let snapshot = self.snapshot();
        if !snapshot.is_expired(self.clock.now(), self.ttl) {
            return snapshot;
        }
        match self.refresh().await {
            Ok(fresh) => fresh,
            Err(e) => {
                log::warn!("Role cache rebuild failed, serving stale snapshot: {e}");
                snapshot
            }
        }
    }

    /// Rebuilds unless another caller is already doing so.
    async fn refresh(&self) -> Result<Arc<RoleSnapshot>> {
        if self
            .rebuilding
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(self.snapshot());
        }
        let _guard = RebuildGuard(&self.rebuilding);
        self.rebuild().await
    }

    /// Unconditionally rebuilds and publishes a new snapshot.
    pub async fn rebuild(&self) -> Result<Arc<RoleSnapshot>> {
        let snapshot = Arc::new(Self::fetch(self.directory.as_ref(), self.clock.as_ref()).await?);
        log::debug!(
            "Role cache rebuilt with {} groups at {}",
            snapshot.group_count(),
            snapshot.built_at()
        );
        self.tx.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    async fn fetch(directory: &dyn GroupDirectory, clock: &dyn Clock) -> Result<RoleSnapshot> {
        let records = directory.list_groups().await?;
        Ok(RoleSnapshot::from_records(records, clock.now()))
    }

    /// Role of `group`, if it has one.
    pub async fn role_of(&self, group: &str) -> Option<String> {
        self.current().await.role_of(group).map(str::to_string)
    }

    /// Groups carrying `role`; empty when the role is unknown.
    pub async fn groups_with_role(&self, role: &str) -> BTreeSet<String> {
        self.current().await.groups_with_role(role)
    }

    /// Returns `true` if both groups carry the same non-empty role.
    pub async fn share_role(&self, group: &str, other: &str) -> bool {
        self.current().await.share_role(group, other)
    }

    /// The configured snapshot lifetime.
    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}

impl fmt::Debug for RoleCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleCache")
            .field("ttl", &self.ttl)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
