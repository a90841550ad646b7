//! Check command: configuration, credential, and package resolution only.
//!
//! Nothing is downloaded or registered.

use anyhow::Result;
use serde::Serialize;

use crate::app::AppContext;
use crate::application::services::{credential, registrar};
use crate::infra::config::load_settings;
use crate::infra::identity::{IdentityEndpoint, ManagedIdentityClient};
use crate::infra::packages::DevOpsPackages;
use crate::output::{TerminalReporter, json};

/// Machine-readable result of `pool-agent check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub url: String,
    pub pool: String,
    pub agent_name: String,
    pub placeholder: bool,
    pub platform: String,
    pub version: String,
    pub download_url: String,
}

/// Entry point for `pool-agent check`.
///
/// # Errors
///
/// Returns the first configuration, authentication, or package-resolution
/// error.
pub async fn run(app: &AppContext) -> Result<()> {
    let settings = load_settings()?;
    let reporter = TerminalReporter::new(&app.output);

    let tokens = ManagedIdentityClient::new(IdentityEndpoint::from_env())?;
    let token = credential::resolve_credential(&tokens, &settings.identity, &reporter).await?;
    let package =
        registrar::resolve_package(&DevOpsPackages::new()?, &settings.url, &token, &reporter)
            .await?;

    let report = CheckReport {
        url: settings.url,
        pool: settings.pool,
        agent_name: settings.agent_name,
        placeholder: settings.placeholder,
        platform: package.platform,
        version: package.version.to_string(),
        download_url: package.download_url,
    };

    if app.is_json() {
        return json::print(&report);
    }
    let out = &app.output;
    out.success("Configuration and credentials are valid");
    out.kv("organization", &report.url);
    out.kv("pool        ", &report.pool);
    out.kv("agent       ", &report.agent_name);
    out.kv("platform    ", &report.platform);
    out.kv("version     ", &report.version);
    out.kv("package     ", &report.download_url);
    Ok(())
}
