//! Role-equivalence policy.
//!
//! Distinct groups that carry the same external role are treated as one:
//! when the caller's group and the entry's owner group share a non-empty
//! role, the POSIX check is done as if the caller belonged to the owner
//! group.

use std::sync::Arc;

use async_trait::async_trait;
use warden_core::{Identity, PathEntry, Result};

use super::PolicyPlugin;
use crate::role_cache::RoleCache;

/// Evaluates role-sharing callers as the owner group.
#[derive(Debug, Clone)]
pub struct RoleSharingPolicy {
    roles: Arc<RoleCache>,
}

impl RoleSharingPolicy {
    /// Creates the policy over an existing role cache.
    pub fn new(roles: Arc<RoleCache>) -> Self {
        Self { roles }
    }

    /// The role cache consulted on every decision.
    pub fn roles(&self) -> &Arc<RoleCache> {
        &self.roles
    }

    /// Applies the role-equivalence rule.
    pub(crate) async fn apply(roles: &RoleCache, entry: &PathEntry, identity: &Identity) -> Identity {
        if identity.group() != entry.owner_group
            && roles.share_role(identity.group(), &entry.owner_group).await
        {
            log::debug!(
                "{} shares a role with owner group {} of {}",
                identity,
                entry.owner_group,
                entry.path
            );
            return identity.with_group(entry.owner_group.clone());
        }
        identity.clone()
    }
}

#[async_trait]
impl PolicyPlugin for RoleSharingPolicy {
    fn name(&self) -> &'static str {
        "role-sharing"
    }

    async fn effective_identity(&self, entry: &PathEntry, identity: &Identity) -> Result<Identity> {
        Ok(Self::apply(&self.roles, entry, identity).await)
    }
}
