//! The authorization entry point.
//!
//! [`Authorizer::has_access`] answers "may this caller perform this
//! operation on each of these paths". It runs, in order:
//!
//! 1. path validation (an empty path fails the whole call)
//! 2. the admin bypass
//! 3. the operation lookup (an unknown name fails the whole call)
//! 4. the global read bypass for read-class operations
//! 5. the operation's [`PolicyTemplate`]
//!
//! Everything after step 3 reports per path through [`BulkResult`].

use std::collections::BTreeSet;
use std::sync::Arc;

use warden_core::{
    BulkResult, Capability, CatalogStore, Clock, Error, GroupDirectory, Identity,
    MetadataSource, MissingStrategy, PermissionBits, Result, SystemClock,
};

use crate::config::AuthorizerConfig;
use crate::operation::Operation;
use crate::resolver::{Lookup, PermissionResolver};

// ============================================================================
// Collaborators
// ============================================================================

/// The external services an authorizer is wired to.
#[derive(Clone)]
pub struct Collaborators {
    /// Namespace storage.
    pub store: Arc<dyn CatalogStore>,
    /// Group registry, for role-based policies.
    pub groups: Arc<dyn GroupDirectory>,
    /// User metadata, for the embargo policy.
    pub metadata: Arc<dyn MetadataSource>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Uses one backend for storage, groups and metadata, with the system clock.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: CatalogStore + GroupDirectory + MetadataSource + 'static,
    {
        Self {
            store: backend.clone(),
            groups: backend.clone(),
            metadata: backend,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

// ============================================================================
// Authorizer
// ============================================================================

/// Decides per-path access for catalog operations.
#[derive(Debug, Clone)]
pub struct Authorizer {
    resolver: PermissionResolver,
    global_read_access: bool,
    admin_capabilities: BTreeSet<Capability>,
}

impl Authorizer {
    /// Creates an authorizer with global read access off and
    /// [`Capability::FileCatalogManagement`] as the admin capability.
    pub fn new(resolver: PermissionResolver) -> Self {
        Self {
            resolver,
            global_read_access: false,
            admin_capabilities: BTreeSet::from([Capability::FileCatalogManagement]),
        }
    }

    /// Builds the configured policy and wires it to `collaborators`.
    pub async fn from_config(
        config: &AuthorizerConfig,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;
        let policy = config.policy.build(config, &collaborators).await?;
        let resolver = PermissionResolver::new(collaborators.store.clone(), policy);
        log::info!(
            "Authorizer ready: policy={}, global_read_access={}",
            config.policy,
            config.global_read_access
        );
        Ok(Self::new(resolver)
            .with_global_read_access(config.global_read_access)
            .with_admin_capabilities(config.admin_capabilities.iter().cloned()))
    }

    /// Sets global read access.
    pub fn with_global_read_access(mut self, enabled: bool) -> Self {
        self.global_read_access = enabled;
        self
    }

    /// Replaces the set of admin capabilities.
    pub fn with_admin_capabilities<I>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Capability>,
    {
        self.admin_capabilities = capabilities.into_iter().collect();
        self
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Whether read-class operations bypass resolution.
    pub fn global_read_access(&self) -> bool {
        self.global_read_access
    }

    /// Returns `true` if `identity` holds any admin capability.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.admin_capabilities
            .iter()
            .any(|capability| identity.has_capability(capability))
    }

    /// Checks `operation`, given by its wire name, on every path.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidInput`] if any path is empty
    /// - [`Error::InvalidOperation`] if `operation` is unknown and the caller
    ///   is not an admin
    ///
    /// Per-path failures land in [`BulkResult::failed`].
    pub async fn has_access<S>(
        &self,
        operation: &str,
        paths: &[S],
        identity: &Identity,
    ) -> Result<BulkResult<bool>>
    where
        S: AsRef<str>,
    {
        match operation.parse::<Operation>() {
            Ok(operation) => self.has_access_for(operation, paths, identity).await,
            Err(err) => {
                let paths = validate_paths(paths)?;
                if !self.is_admin(identity) {
                    return Err(err);
                }
                log::info!(
                    "Admin {} granted unknown {} on {} path(s)",
                    identity,
                    operation,
                    paths.len()
                );
                Ok(BulkResult::uniform(paths, true))
            }
        }
    }

    /// Same as [`has_access`](Self::has_access) for an already parsed
    /// operation.
    pub async fn has_access_for<S>(
        &self,
        operation: Operation,
        paths: &[S],
        identity: &Identity,
    ) -> Result<BulkResult<bool>>
    where
        S: AsRef<str>,
    {
        let paths = validate_paths(paths)?;
        if self.is_admin(identity) {
            log::info!("Admin {} granted {} on {} path(s)", identity, operation, paths.len());
            return Ok(BulkResult::uniform(paths, true));
        }
        Ok(self.decide(operation, paths, identity).await)
    }

    /// Returns the full permission bits of every path.
    ///
    /// Each path is resolved as a file, then as a directory; a path that is
    /// neither fails with `NotFound`. Admins get every bit.
    pub async fn path_permissions<S>(
        &self,
        paths: &[S],
        identity: &Identity,
    ) -> Result<BulkResult<PermissionBits>>
    where
        S: AsRef<str>,
    {
        let paths = validate_paths(paths)?;
        if self.is_admin(identity) {
            return Ok(BulkResult::uniform(paths, PermissionBits::ALL));
        }
        let resolver = &self.resolver;
        Ok(BulkResult::evaluate(paths, |path| async move {
            resolver
                .resolve_any(
                    &path,
                    identity,
                    Lookup::exact(MissingStrategy::PropagateError),
                )
                .await
        })
        .await)
    }

    async fn decide(
        &self,
        operation: Operation,
        paths: BTreeSet<String>,
        identity: &Identity,
    ) -> BulkResult<bool> {
        if self.global_read_access && operation.is_read() {
            log::info!("Global read access granted {} to {}", operation, identity);
            return BulkResult::uniform(paths, true);
        }
        let result = operation
            .template()
            .evaluate(&self.resolver, &paths, identity)
            .await;
        if !result.failed().is_empty() {
            log::debug!(
                "{} for {}: {} path(s) failed",
                operation,
                identity,
                result.failed().len()
            );
        }
        result
    }
}

fn validate_paths<S: AsRef<str>>(paths: &[S]) -> Result<BTreeSet<String>> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            if path.is_empty() {
                Err(Error::invalid_input("path must not be empty"))
            } else {
                Ok(path.to_string())
            }
        })
        .collect()
}
