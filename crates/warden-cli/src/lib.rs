//! # warden-cli
//!
//! Command-line front end for the Warden catalog authorizer.
//!
//! - `warden check OPERATION PATH... -u USER -g GROUP`: per-path decision
//! - `warden permissions PATH... -u USER -g GROUP`: permission bits
//! - `warden operations`: the operation table
//! - `warden config`: the effective configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod commands;

pub use cli::{CallerArgs, Cli, Command};
pub use commands::run;
