//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use warden_core::{Capability, Identity};

/// Warden - authorization checks against a file catalog
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Authorizer configuration (TOML)
    #[arg(short, long, env = "WARDEN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Catalog fixture (JSON)
    #[arg(long, env = "WARDEN_CATALOG", global = true)]
    pub catalog: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check an operation on one or more paths
    Check {
        /// Operation name, e.g. `addFile`
        operation: String,
        /// Catalog paths
        #[arg(required = true)]
        paths: Vec<String>,
        #[command(flatten)]
        caller: CallerArgs,
    },
    /// Show the permission bits of one or more paths
    Permissions {
        /// Catalog paths
        #[arg(required = true)]
        paths: Vec<String>,
        #[command(flatten)]
        caller: CallerArgs,
    },
    /// List every operation with its class and template
    Operations,
    /// Print the effective configuration
    Config,
}

/// The caller on whose behalf a check runs.
#[derive(Args, Debug, Clone)]
pub struct CallerArgs {
    /// User name
    #[arg(short, long)]
    pub user: String,
    /// Group the user acts as
    #[arg(short, long)]
    pub group: String,
    /// Capability held by the group (repeatable)
    #[arg(long = "capability", value_name = "NAME")]
    pub capabilities: Vec<String>,
}

impl CallerArgs {
    /// Builds the identity.
    pub fn identity(&self) -> Identity {
        Identity::new(&self.user, &self.group)
            .with_capabilities(self.capabilities.iter().map(|c| Capability::from(c.as_str())))
    }
}
