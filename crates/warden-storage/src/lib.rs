//! # warden-storage
//!
//! Storage backend implementations for the Warden catalog authorizer.
//!
//! This crate provides:
//! - [`MemoryCatalog`]: in-memory directory tree, file table, group registry
//!   and user metadata, implementing every Warden collaborator trait
//! - [`CatalogFixture`]: JSON snapshot format used to seed a catalog

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod memory;

pub use memory::{CatalogFixture, MemoryCatalog, NodeSpec, DEFAULT_MODE};
