//! Warden ACL: permission resolution, identity policies, and the
//! operation authorizer.
//!
//! # Modules
//!
//! - [`resolver`]: Hierarchical POSIX resolution with missing-path strategies
//! - [`policy`]: Identity-substitution policies
//! - [`role_cache`]: TTL-bound group/role snapshot
//! - [`operation`]: Catalog operation taxonomy
//! - [`template`]: Bulk permission templates
//! - [`authorizer`]: The `has_access` entry point
//! - [`config`]: TOML configuration

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod authorizer;
pub mod config;
pub mod operation;
pub mod policy;
pub mod resolver;
pub mod role_cache;
pub mod template;

pub use authorizer::{Authorizer, Collaborators};
pub use config::AuthorizerConfig;
pub use operation::{Operation, OperationClass};
pub use policy::{EmbargoConfig, EmbargoPolicy, PolicyKind, PolicyPlugin, PosixPolicy, RoleSharingPolicy};
pub use resolver::{Lookup, PermissionResolver};
pub use role_cache::{RoleCache, RoleSnapshot};
pub use template::PolicyTemplate;
