//! Warden Core: shared types, collaborator traits, errors, and utilities.
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`identity`]: Caller identity and capabilities
//! - [`path`]: Catalog entries and parent-path helpers
//! - [`permission`]: Permission bits and the non-existence strategy
//! - [`bulk`]: Partitioned per-path results
//! - [`backend`]: Storage, identity, and metadata collaborator traits
//! - [`clock`]: Injectable wall clock

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod bulk;
pub mod clock;
pub mod error;
pub mod identity;
pub mod path;
pub mod permission;

// Re-export key types at crate root for convenience
pub use backend::{CatalogStore, GroupDirectory, GroupRecord, MetadataSource};
pub use bulk::BulkResult;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use identity::{Capability, Identity};
pub use path::{EntryKind, MetadataBag, PathEntry};
pub use permission::{MissingStrategy, Permission, PermissionBits};
