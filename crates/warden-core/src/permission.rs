//! POSIX-like permission bits and the non-existence fallback strategy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single permission bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Read (`r`)
    Read,
    /// Write (`w`)
    Write,
    /// Execute / traverse (`x`)
    Execute,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "Read"),
            Self::Write => write!(f, "Write"),
            Self::Execute => write!(f, "Execute"),
        }
    }
}

/// Resolved permissions for one (path, identity) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionBits {
    /// Read access
    pub read: bool,
    /// Write access
    pub write: bool,
    /// Execute access
    pub execute: bool,
}

impl PermissionBits {
    /// All three bits set.
    pub const ALL: Self = Self::uniform(true);

    /// No bit set.
    pub const NONE: Self = Self::uniform(false);

    /// Every bit set to `value`.
    pub const fn uniform(value: bool) -> Self {
        Self {
            read: value,
            write: value,
            execute: value,
        }
    }

    /// Decodes a three-bit `rwx` triplet (e.g. `0o5` is `r-x`).
    pub const fn from_triplet(bits: u32) -> Self {
        Self {
            read: bits & 0o4 != 0,
            write: bits & 0o2 != 0,
            execute: bits & 0o1 != 0,
        }
    }

    /// Returns the value of one bit.
    pub fn get(&self, permission: Permission) -> bool {
        match permission {
            Permission::Read => self.read,
            Permission::Write => self.write,
            Permission::Execute => self.execute,
        }
    }
}

impl fmt::Display for PermissionBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.read, 'r'),
            flag(self.write, 'w'),
            flag(self.execute, 'x')
        )
    }
}

/// What to answer when the queried entry does not exist.
///
/// Only consulted for non-recursive lookups: a recursive lookup walks to
/// the parent instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingStrategy {
    /// Grant every bit.
    Allow,
    /// Deny every bit.
    Deny,
    /// Surface the `NotFound` error to the caller.
    #[default]
    PropagateError,
}

impl MissingStrategy {
    /// Applies the strategy to a `NotFound` error.
    pub fn resolve(self, not_found: Error) -> Result<PermissionBits> {
        match self {
            Self::Allow => Ok(PermissionBits::ALL),
            Self::Deny => Ok(PermissionBits::NONE),
            Self::PropagateError => Err(not_found),
        }
    }
}
