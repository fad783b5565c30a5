//! Identity-substitution policies.
//!
//! A [`PolicyPlugin`] runs after the resolver has found an existing entry and
//! before the POSIX bits are computed. It never returns permission bits: it
//! only picks the identity the storage layer evaluates the entry for. That
//! keeps every policy composable with the same resolver and the same bulk
//! templates.
//!
//! # Variants
//!
//! - [`PosixPolicy`]: plain POSIX, the caller is evaluated as themselves
//! - [`RoleSharingPolicy`]: callers whose group shares a role with the owner
//!   group are evaluated as the owner group
//! - [`EmbargoPolicy`]: time- and ownership-based embargo over a protected
//!   subtree

mod embargo;
mod posix;
mod role_sharing;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use warden_core::{Error, Identity, PathEntry, Result};

pub use embargo::{
    ACCOUNT_KEY, ACCOUNT_REMAP, COMMON_TAG, COUNTRY_KEY, COUNTRY_REMAP, EmbargoConfig,
    EmbargoPolicy, EmbargoTags, OWNER_TAG, START_FORMAT, START_KEY, account_tags, parse_start,
    remap_country,
};
pub use posix::PosixPolicy;
pub use role_sharing::RoleSharingPolicy;

use crate::authorizer::Collaborators;
use crate::config::AuthorizerConfig;
use crate::role_cache::RoleCache;

/// Chooses the identity used for the POSIX check of one entry.
#[async_trait]
pub trait PolicyPlugin: Send + Sync {
    /// Short policy name, used in logs.
    fn name(&self) -> &'static str;

    /// Returns the identity to evaluate `entry` for.
    ///
    /// Implementations return a new value; `identity` itself is never
    /// modified.
    async fn effective_identity(&self, entry: &PathEntry, identity: &Identity)
    -> Result<Identity>;
}

/// Which policy an authorizer is configured with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// [`PosixPolicy`]
    #[default]
    Posix,
    /// [`RoleSharingPolicy`]
    RoleSharing,
    /// [`EmbargoPolicy`]
    Embargo,
}

impl PolicyKind {
    /// Every policy kind.
    pub const ALL: [PolicyKind; 3] = [Self::Posix, Self::RoleSharing, Self::Embargo];

    /// The configuration name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posix => "posix",
            Self::RoleSharing => "role-sharing",
            Self::Embargo => "embargo",
        }
    }

    /// Constructs the configured policy.
    ///
    /// Policies backed by a [`RoleCache`] build its first snapshot here.
    pub async fn build(
        self,
        config: &AuthorizerConfig,
        collaborators: &Collaborators,
    ) -> Result<Arc<dyn PolicyPlugin>> {
        let policy: Arc<dyn PolicyPlugin> = match self {
            Self::Posix => Arc::new(PosixPolicy),
            Self::RoleSharing => Arc::new(RoleSharingPolicy::new(
                load_role_cache(config, collaborators).await?,
            )),
            Self::Embargo => {
                let mut policy = EmbargoPolicy::new(
                    config.embargo.clone(),
                    collaborators.metadata.clone(),
                    collaborators.clock.clone(),
                );
                if config.embargo.share_roles {
                    policy = policy.with_role_cache(load_role_cache(config, collaborators).await?);
                }
                Arc::new(policy)
            }
        };
        log::debug!("Configured '{}' policy", policy.name());
        Ok(policy)
    }
}

async fn load_role_cache(
    config: &AuthorizerConfig,
    collaborators: &Collaborators,
) -> Result<Arc<RoleCache>> {
    let cache = RoleCache::load(
        collaborators.groups.clone(),
        collaborators.clock.clone(),
        config.role_cache_ttl(),
    )
    .await?;
    Ok(Arc::new(cache))
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown policy '{s}'")))
    }
}
