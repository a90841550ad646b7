//! Settings loader: reads `AZP_*` variables via `envy` and validates them
//! with `AgentSettings::from_env`.

use anyhow::{Context, Result};

use crate::domain::{AgentEnv, AgentSettings};

/// Environment prefix for every bootstrap variable.
pub const ENV_PREFIX: &str = "AZP_";

/// Load settings from the process environment.
///
/// # Errors
///
/// Returns a `ConfigurationError` (inside `anyhow`) for missing or
/// malformed variables.
pub fn load_settings() -> Result<AgentSettings> {
    let env: AgentEnv = envy::prefixed(ENV_PREFIX)
        .from_env()
        .context("failed to read AZP_* environment variables")?;
    Ok(AgentSettings::from_env(env, &host_name())?)
}

/// Load settings from explicit key/value pairs instead of the process
/// environment.
///
/// # Errors
///
/// Same as [`load_settings`].
pub fn load_settings_from<I>(vars: I, host_name: &str) -> Result<AgentSettings>
where
    I: IntoIterator<Item = (String, String)>,
{
    let env: AgentEnv = envy::prefixed(ENV_PREFIX)
        .from_iter(vars)
        .context("failed to read AZP_* environment variables")?;
    Ok(AgentSettings::from_env(env, host_name)?)
}

/// The machine's host name, or empty if it cannot be read.
#[must_use]
pub fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default()
}
