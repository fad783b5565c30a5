//! Authorizer configuration.
//!
//! Loaded from TOML; every key is optional. A minimal file:
//!
//! ```toml
//! global_read_access = false
//! policy = "embargo"
//! role_cache_ttl_secs = 600
//! admin_capabilities = ["FileCatalogManagement"]
//!
//! [embargo]
//! protected_group = "eiscat_files"
//! group_prefix = "eiscat_"
//! lapse_months = 13
//! share_roles = false
//! ```
//!
//! `WARDEN_GLOBAL_READ_ACCESS` and `WARDEN_POLICY` override the file.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_core::{Capability, Error, Result};

use crate::policy::{EmbargoConfig, PolicyKind};

/// Environment variable overriding `global_read_access`.
pub const ENV_GLOBAL_READ_ACCESS: &str = "WARDEN_GLOBAL_READ_ACCESS";
/// Environment variable overriding `policy`.
pub const ENV_POLICY: &str = "WARDEN_POLICY";

/// Settings for [`Authorizer::from_config`](crate::Authorizer::from_config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizerConfig {
    /// Let every caller through on read-class operations.
    pub global_read_access: bool,
    /// The identity-substitution policy.
    pub policy: PolicyKind,
    /// Role cache lifetime in seconds.
    pub role_cache_ttl_secs: u64,
    /// Capabilities that make a caller an administrator.
    pub admin_capabilities: Vec<Capability>,
    /// Embargo policy settings.
    pub embargo: EmbargoConfig,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            global_read_access: false,
            policy: PolicyKind::default(),
            role_cache_ttl_secs: 600,
            admin_capabilities: vec![Capability::FileCatalogManagement],
            embargo: EmbargoConfig::default(),
        }
    }
}

impl AuthorizerConfig {
    /// Reads `path`, applies the environment overrides and validates.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let mut config = Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        config.apply_env()?;
        config.validate()?;
        log::debug!("Loaded authorizer config from {}", path.display());
        Ok(config)
    }

    /// Parses a TOML document without applying overrides.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))
    }

    /// Serializes to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_GLOBAL_READ_ACCESS) {
            self.global_read_access = parse_bool(&raw).ok_or_else(|| {
                Error::config(format!("{ENV_GLOBAL_READ_ACCESS}: expected a boolean, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_POLICY) {
            self.policy = raw.trim().parse()?;
        }
        Ok(())
    }

    /// Rejects settings the authorizer cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.role_cache_ttl_secs == 0 && self.policy != PolicyKind::Posix {
            log::warn!("role_cache_ttl_secs is 0, the role cache rebuilds on every access");
        }
        self.embargo.validate()
    }

    /// The role cache lifetime.
    pub fn role_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.role_cache_ttl_secs)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
