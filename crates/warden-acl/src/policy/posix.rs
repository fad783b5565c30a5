//! Plain POSIX policy.

use async_trait::async_trait;
use warden_core::{Identity, PathEntry, Result};

use super::PolicyPlugin;

/// Evaluates every entry for the caller's own identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixPolicy;

#[async_trait]
impl PolicyPlugin for PosixPolicy {
    fn name(&self) -> &'static str {
        "posix"
    }

    async fn effective_identity(
        &self,
        _entry: &PathEntry,
        identity: &Identity,
    ) -> Result<Identity> {
        Ok(identity.clone())
    }
}
