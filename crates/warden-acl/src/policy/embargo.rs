//! Time- and ownership-based embargo over a protected subtree.
//!
//! Entries owned by the protected group carry user metadata describing the
//! observation they belong to: a `start` timestamp, a `country` code and an
//! `account` string. While the embargo runs, only callers whose group tag
//! matches one of those codes are evaluated as the owner group. Once the
//! embargo lapses every caller is.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use warden_core::path::parent_path;
use warden_core::{
    Clock, EntryKind, Error, Identity, MetadataBag, MetadataSource, PathEntry, Result,
};

use super::PolicyPlugin;
use super::role_sharing::RoleSharingPolicy;
use crate::role_cache::RoleCache;

/// Metadata key holding the embargo start.
pub const START_KEY: &str = "start";
/// Metadata key holding the country code.
pub const COUNTRY_KEY: &str = "country";
/// Metadata key holding the account string.
pub const ACCOUNT_KEY: &str = "account";
/// `chrono` format of the start timestamp, e.g. `2023-05-17/08:30:00`.
pub const START_FORMAT: &str = "%Y-%m-%d/%H:%M:%S";

/// Tag reserved to the owner group.
pub const OWNER_TAG: &str = "owner";
/// Tag open to every caller.
pub const COMMON_TAG: &str = "common";

/// Country codes rewritten before matching.
pub const COUNTRY_REMAP: &[(&str, &str)] = &[
    ("NI", "JP"),
    ("SW", "SE"),
    ("GE", "DE"),
    ("SP", OWNER_TAG),
    ("CP", COMMON_TAG),
    ("AA", COMMON_TAG),
    ("G4", COMMON_TAG),
    ("G2", COMMON_TAG),
    ("G7", COMMON_TAG),
];

/// Account codes that add an extra tag to the account set.
pub const ACCOUNT_REMAP: &[(&str, &str)] = &[
    ("NI", "JP"),
    ("SW", "SE"),
    ("GE", "DE"),
    ("SP", OWNER_TAG),
    ("CP", COMMON_TAG),
];

// ============================================================================
// Configuration
// ============================================================================

/// Embargo settings, the `[embargo]` table of the authorizer config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbargoConfig {
    /// Owner group of the embargoed subtree.
    pub protected_group: String,
    /// Prefix of caller groups that carry a country tag.
    pub group_prefix: String,
    /// Embargo duration in months.
    pub lapse_months: u32,
    /// Fall back to role sharing when the embargo rule does not apply.
    pub share_roles: bool,
}

impl Default for EmbargoConfig {
    fn default() -> Self {
        Self {
            protected_group: "eiscat_files".to_string(),
            group_prefix: "eiscat_".to_string(),
            lapse_months: 13,
            share_roles: false,
        }
    }
}

impl EmbargoConfig {
    /// Checks the settings for values the policy cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.lapse_months == 0 {
            return Err(Error::config("embargo.lapse_months must be greater than 0"));
        }
        if self.group_prefix.is_empty() {
            return Err(Error::config("embargo.group_prefix must not be empty"));
        }
        if self.protected_group.is_empty() {
            return Err(Error::config("embargo.protected_group must not be empty"));
        }
        Ok(())
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Applies [`COUNTRY_REMAP`] to a country code.
pub fn remap_country(code: &str) -> String {
    COUNTRY_REMAP
        .iter()
        .find(|(from, _)| *from == code)
        .map_or(code, |(_, to)| *to)
        .to_string()
}

/// Builds the account tag set.
///
/// The set holds the whole account string, each comma, semicolon or
/// whitespace separated token, and the [`ACCOUNT_REMAP`] target of every
/// token that has one.
pub fn account_tags(account: &str) -> BTreeSet<String> {
    let account = account.trim();
    let mut tags = BTreeSet::new();
    if account.is_empty() {
        return tags;
    }
    tags.insert(account.to_string());
    for token in account
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        tags.insert(token.to_string());
        if let Some((_, to)) = ACCOUNT_REMAP.iter().find(|(from, _)| *from == token) {
            tags.insert((*to).to_string());
        }
    }
    tags
}

/// Parses a start timestamp in [`START_FORMAT`], read as UTC.
pub fn parse_start(value: &str) -> chrono::ParseResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), START_FORMAT).map(|naive| naive.and_utc())
}

/// Country and account tags derived from an entry's metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmbargoTags {
    /// Remapped country code.
    pub country: Option<String>,
    /// Account tag set.
    pub accounts: Option<BTreeSet<String>>,
}

impl EmbargoTags {
    /// Extracts the tags; absent, empty and `None` values count as missing.
    pub fn from_metadata(metadata: &MetadataBag) -> Self {
        Self {
            country: metadata_value(metadata, COUNTRY_KEY).map(remap_country),
            accounts: metadata_value(metadata, ACCOUNT_KEY)
                .map(account_tags)
                .filter(|tags| !tags.is_empty()),
        }
    }

    /// Returns `true` when a caller tagged `requester` gets public access.
    pub fn grants(&self, requester: &str) -> bool {
        match (&self.country, &self.accounts) {
            (None, None) => true,
            (country, accounts) => {
                let country_match = country
                    .as_deref()
                    .is_some_and(|c| c == COMMON_TAG || c == requester);
                let account_match = accounts
                    .as_ref()
                    .is_some_and(|tags| tags.contains(requester));
                country_match || account_match
            }
        }
    }
}

fn metadata_value<'a>(metadata: &'a MetadataBag, key: &str) -> Option<&'a str> {
    metadata
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && *v != "None")
}

fn or_empty(result: Result<MetadataBag>) -> Result<MetadataBag> {
    match result {
        Err(e) if e.is_not_found() => Ok(MetadataBag::new()),
        other => other,
    }
}

// ============================================================================
// Policy
// ============================================================================

/// The embargo policy.
pub struct EmbargoPolicy {
    config: EmbargoConfig,
    metadata: Arc<dyn MetadataSource>,
    clock: Arc<dyn Clock>,
    roles: Option<Arc<RoleCache>>,
}

impl EmbargoPolicy {
    /// Creates the policy.
    pub fn new(
        config: EmbargoConfig,
        metadata: Arc<dyn MetadataSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            metadata,
            clock,
            roles: None,
        }
    }

    /// Applies role sharing wherever the embargo rule leaves the caller as is.
    pub fn with_role_cache(mut self, roles: Arc<RoleCache>) -> Self {
        self.roles = Some(roles);
        self
    }

    /// The active settings.
    pub fn config(&self) -> &EmbargoConfig {
        &self.config
    }

    /// Returns `true` when an embargo that started at `start` has lapsed.
    pub fn is_lapsed(&self, start: DateTime<Utc>) -> bool {
        self.clock
            .now()
            .checked_sub_months(Months::new(self.config.lapse_months))
            .is_some_and(|cutoff| start < cutoff)
    }

    /// Fetches the user metadata of `entry`.
    ///
    /// Inline metadata wins. For files the parent directory's bag is merged
    /// over the file's own. A missing bag is treated as empty.
    pub async fn user_metadata(&self, entry: &PathEntry) -> Result<MetadataBag> {
        if let Some(metadata) = &entry.metadata {
            return Ok(metadata.clone());
        }
        match entry.kind {
            EntryKind::Directory => {
                or_empty(self.metadata.directory_user_metadata(&entry.path).await)
            }
            EntryKind::File => {
                let mut merged = or_empty(self.metadata.file_user_metadata(&entry.path).await)?;
                let directory = or_empty(
                    self.metadata
                        .directory_user_metadata(parent_path(&entry.path))
                        .await,
                )?;
                merged.extend(directory);
                Ok(merged)
            }
        }
    }

    async fn pass_through(&self, entry: &PathEntry, identity: &Identity) -> Identity {
        match &self.roles {
            Some(roles) => RoleSharingPolicy::apply(roles, entry, identity).await,
            None => identity.clone(),
        }
    }
}

#[async_trait]
impl PolicyPlugin for EmbargoPolicy {
    fn name(&self) -> &'static str {
        "embargo"
    }

    async fn effective_identity(&self, entry: &PathEntry, identity: &Identity) -> Result<Identity> {
        if entry.owner_group != self.config.protected_group {
            return Ok(self.pass_through(entry, identity).await);
        }

        let metadata = self.user_metadata(entry).await?;
        if metadata.is_empty() {
            log::debug!("No embargo metadata for {}", entry.path);
            return Ok(self.pass_through(entry, identity).await);
        }

        if let Some(raw) = metadata_value(&metadata, START_KEY) {
            let start = parse_start(raw).map_err(|e| {
                Error::metadata(&entry.path, format!("bad {START_KEY} '{raw}': {e}"))
            })?;
            if self.is_lapsed(start) {
                log::info!(
                    "Embargo on {} lapsed (started {}), granting {}",
                    entry.path,
                    start,
                    identity.username()
                );
                return Ok(identity.with_group(entry.owner_group.clone()));
            }
        }

        let requester = identity
            .group()
            .strip_prefix(self.config.group_prefix.as_str())
            .filter(|tag| !tag.is_empty());
        let Some(requester) = requester else {
            log::debug!("{} has no embargo tag for {}", identity, entry.path);
            return Ok(self.pass_through(entry, identity).await);
        };

        let tags = EmbargoTags::from_metadata(&metadata);
        if tags.grants(requester) {
            log::info!(
                "Embargo tag '{}' matches {:?} on {}, granting {}",
                requester,
                tags,
                entry.path,
                identity.username()
            );
            return Ok(identity.with_group(entry.owner_group.clone()));
        }

        log::debug!("Embargo keeps {} on {}", identity, entry.path);
        Ok(self.pass_through(entry, identity).await)
    }
}

impl fmt::Debug for EmbargoPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbargoPolicy")
            .field("config", &self.config)
            .field("share_roles", &self.roles.is_some())
            .finish()
    }
}
