//! Subcommand handlers.
//!
//! Handlers return the text to print so they can be tested without
//! capturing stdout.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use warden_acl::{Authorizer, AuthorizerConfig, Collaborators, Operation};
use warden_storage::MemoryCatalog;

use crate::cli::{CallerArgs, Cli, Command};

// ============================================================================
// Dispatch
// ============================================================================

/// Runs the selected subcommand.
pub async fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref())?;
    match &cli.command {
        Command::Check {
            operation,
            paths,
            caller,
        } => cmd_check(&config, cli.catalog.as_deref(), operation, paths, caller).await,
        Command::Permissions { paths, caller } => {
            cmd_permissions(&config, cli.catalog.as_deref(), paths, caller).await
        }
        Command::Operations => Ok(cmd_operations()),
        Command::Config => Ok(config.to_toml_string()?),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// `warden check`: the per-path decision as JSON.
pub async fn cmd_check(
    config: &AuthorizerConfig,
    catalog: Option<&Path>,
    operation: &str,
    paths: &[String],
    caller: &CallerArgs,
) -> Result<String> {
    let authz = authorizer(config, catalog).await?;
    let identity = caller.identity();
    tracing::debug!("Checking {operation} for {identity} on {} path(s)", paths.len());
    let result = authz
        .has_access(operation, paths, &identity)
        .await
        .with_context(|| format!("checking '{operation}'"))?;
    Ok(serde_json::to_string_pretty(&result)?)
}

/// `warden permissions`: the permission bits per path as JSON.
pub async fn cmd_permissions(
    config: &AuthorizerConfig,
    catalog: Option<&Path>,
    paths: &[String],
    caller: &CallerArgs,
) -> Result<String> {
    let authz = authorizer(config, catalog).await?;
    let result = authz.path_permissions(paths, &caller.identity()).await?;
    Ok(serde_json::to_string_pretty(&result)?)
}

/// `warden operations`: the operation table.
pub fn cmd_operations() -> String {
    let mut out = format!("{:<22} {:<6} {}\n", "OPERATION", "CLASS", "TEMPLATE");
    for op in Operation::ALL {
        out.push_str(&format!(
            "{:<22} {:<6} {}\n",
            op.name(),
            op.class().to_string(),
            op.template()
        ));
    }
    out
}

// ============================================================================
// Helpers
// ============================================================================

/// Loads the config file, or the defaults plus environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<AuthorizerConfig> {
    match path {
        Some(path) => Ok(AuthorizerConfig::load(path)?),
        None => {
            let mut config = AuthorizerConfig::default();
            config.apply_env()?;
            config.validate()?;
            Ok(config)
        }
    }
}

async fn authorizer(config: &AuthorizerConfig, catalog: Option<&Path>) -> Result<Authorizer> {
    let Some(catalog) = catalog else {
        bail!("a catalog fixture is required (--catalog or WARDEN_CATALOG)");
    };
    let backend = MemoryCatalog::from_json_file(catalog)
        .with_context(|| format!("loading catalog {}", catalog.display()))?;
    tracing::info!("Using catalog {}", catalog.display());
    let authz = Authorizer::from_config(config, Collaborators::from_backend(Arc::new(backend)))
        .await?;
    Ok(authz)
}
