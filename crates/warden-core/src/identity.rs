//! Caller identity as seen by the authorization engine.
//!
//! An [`Identity`] is built once by the boundary layer for each request and
//! never mutated afterwards. Policies that need to evaluate a request "as"
//! another group derive a fresh value with [`Identity::with_group`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A capability (property) granted to the caller's group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Capability {
    /// Full management rights over the catalog.
    FileCatalogManagement,
    /// Requests come from a trusted service host.
    TrustedHost,
    /// Any other property name, kept verbatim.
    Other(String),
}

impl Capability {
    /// Returns the canonical property name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::FileCatalogManagement => "FileCatalogManagement",
            Self::TrustedHost => "TrustedHost",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Capability {
    fn from(s: String) -> Self {
        match s.as_str() {
            "FileCatalogManagement" => Self::FileCatalogManagement,
            "TrustedHost" => Self::TrustedHost,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Capability {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Capability> for String {
    fn from(c: Capability) -> Self {
        c.as_str().to_string()
    }
}

impl FromStr for Capability {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

/// Authenticated caller principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    username: String,
    group: String,
    #[serde(default)]
    capabilities: BTreeSet<Capability>,
}

impl Identity {
    /// Creates an identity with no capabilities.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::Identity;
    ///
    /// let id = Identity::new("alice", "eiscat_SE");
    /// assert_eq!(id.username(), "alice");
    /// assert_eq!(id.group(), "eiscat_SE");
    /// ```
    pub fn new(username: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            group: group.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// Adds a capability, consuming and returning the identity.
    pub fn with_capability(mut self, capability: impl Into<Capability>) -> Self {
        self.capabilities.insert(capability.into());
        self
    }

    /// Adds several capabilities at once.
    pub fn with_capabilities<I, C>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Capability>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Derives a new identity with the same username acting as `group`.
    ///
    /// Capabilities are dropped: a derived identity is only ever used for
    /// the POSIX bit check, never for bypass decisions.
    pub fn with_group(&self, group: impl Into<String>) -> Self {
        Self {
            username: self.username.clone(),
            group: group.into(),
            capabilities: BTreeSet::new(),
        }
    }

    /// The caller's user name.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The caller's group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// All capabilities held by the caller.
    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    /// Returns `true` if the caller holds `capability`.
    pub fn has_capability(&self, capability: &Capability) -> bool {
        self.capabilities.contains(capability)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.group)
    }
}
