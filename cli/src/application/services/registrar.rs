//! Application service: Agent Registrar.
//!
//! Resolve the platform-matched package, install it, register the agent.
//! Every failure here is fatal.

use std::path::Path;

use anyhow::{Context, Result};
use pool_common::{AgentPackage, Platform};

use crate::application::ports::{AgentPackages, AgentTool, ProgressReporter};
use crate::domain::{AccessToken, PackageResolutionError, RegistrationRecord};

/// Find the latest agent package for the running platform.
///
/// # Errors
///
/// Returns `PackageResolutionError` if the platform is unsupported or the
/// organization lists no matching package.
pub async fn resolve_package(
    packages: &impl AgentPackages,
    url: &str,
    token: &AccessToken,
    reporter: &impl ProgressReporter,
) -> Result<AgentPackage> {
    reporter.step("Determining matching Azure Pipelines agent...");
    let platform = Platform::current().map_err(PackageResolutionError::from)?;
    let package = packages.latest(url, token, platform).await?;
    tracing::info!(
        platform = %platform,
        version = %package.version,
        filename = %package.filename,
        "agent package resolved"
    );
    Ok(package)
}

/// Download and unpack `package` into `dest`.
///
/// # Errors
///
/// Propagates download, checksum, and unpack failures.
pub async fn install(
    packages: &impl AgentPackages,
    package: &AgentPackage,
    dest: &Path,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("Downloading and extracting Azure Pipelines agent...");
    packages
        .install(package, dest)
        .await
        .with_context(|| format!("installing agent {} into {}", package.version, dest.display()))?;
    reporter.success(&format!("Agent {} installed", package.version));
    Ok(())
}

/// Unattended registration of `record` with replace semantics.
///
/// # Errors
///
/// Propagates the agent tool's `RegistrationError`.
pub async fn register(
    tool: &impl AgentTool,
    url: &str,
    record: &RegistrationRecord,
    token: &AccessToken,
    reporter: &impl ProgressReporter,
) -> Result<()> {
    reporter.step("Configuring Azure Pipelines agent...");
    tool.configure(url, record, token).await?;
    tracing::info!(
        agent = %record.agent_name,
        pool = %record.pool,
        work = %record.work_dir,
        replace = record.replace,
        "agent registered"
    );
    reporter.success(&format!(
        "Agent '{}' registered in pool '{}'",
        record.agent_name, record.pool
    ));
    Ok(())
}
