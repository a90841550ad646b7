//! Bootstrap settings and their validation.
//!
//! Pure functions only: no I/O, no async, no environment access. The raw
//! `AgentEnv` is filled in by `infra::config` (envy, `AZP_` prefix).

use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::credential::IdentityReference;
use crate::domain::error::ConfigurationError;
use crate::domain::registration::RegistrationRecord;
use crate::domain::retry::{DEFAULT_REMOVE_INTERVAL, RetryPolicy};

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_POOL: &str = "Default";
pub const DEFAULT_WORK_DIR: &str = "_work";

// ── Raw environment ──────────────────────────────────────────────────────────

/// `AZP_*` variables exactly as found in the environment.
///
/// Each field maps to `AZP_<FIELD>`:
///   - `AZP_URL`                 (required)
///   - `AZP_CLIENTID`            (required)
///   - `AZP_POOL`                (default `Default`)
///   - `AZP_AGENT_NAME`          (default host name)
///   - `AZP_WORK`                (default `_work`)
///   - `AZP_PLACEHOLDER`         (non-empty enables placeholder mode)
///   - `AZP_AGENT_DIR`           (default current directory)
///   - `AZP_REMOVE_RETRY_SECS`   (default 30)
///   - `AZP_REMOVE_MAX_ATTEMPTS` (default unbounded)
#[derive(Debug, Default, Deserialize)]
pub struct AgentEnv {
    pub url: Option<String>,
    pub clientid: Option<String>,
    pub pool: Option<String>,
    pub agent_name: Option<String>,
    pub work: Option<String>,
    pub placeholder: Option<String>,
    pub agent_dir: Option<String>,
    pub remove_retry_secs: Option<String>,
    pub remove_max_attempts: Option<String>,
}

// ── Validated settings ───────────────────────────────────────────────────────

/// Everything the bootstrap needs, validated.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Organization URL without a trailing slash.
    pub url: String,
    pub identity: IdentityReference,
    pub pool: String,
    pub agent_name: String,
    pub work_dir: String,
    pub placeholder: bool,
    /// Directory the agent package is unpacked into.
    pub agent_dir: PathBuf,
    pub retry: RetryPolicy,
}

impl AgentSettings {
    /// Validate raw input. `host_name` is the fallback agent name.
    ///
    /// Blank values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::Missing` for an absent `AZP_URL` or
    /// `AZP_CLIENTID` (URL checked first), `ConfigurationError::Invalid` for
    /// malformed values.
    pub fn from_env(env: AgentEnv, host_name: &str) -> Result<Self, ConfigurationError> {
        let url = non_blank(env.url).ok_or(ConfigurationError::Missing { name: "AZP_URL" })?;
        let client_id =
            non_blank(env.clientid).ok_or(ConfigurationError::Missing { name: "AZP_CLIENTID" })?;
        let url = validate_url(&url)?;

        let agent_name = match non_blank(env.agent_name) {
            Some(name) => name,
            None if !host_name.trim().is_empty() => host_name.trim().to_string(),
            None => {
                return Err(ConfigurationError::Invalid {
                    name: "AZP_AGENT_NAME",
                    reason: "not set and the host name is unavailable".to_string(),
                });
            }
        };

        let interval = match non_blank(env.remove_retry_secs) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigurationError::Invalid {
                        name: "AZP_REMOVE_RETRY_SECS",
                        reason: format!("expected a positive number of seconds, got '{raw}'"),
                    });
                }
            },
            None => DEFAULT_REMOVE_INTERVAL,
        };

        let max_attempts = match non_blank(env.remove_max_attempts) {
            Some(raw) => Some(raw.parse::<NonZeroU32>().map_err(|_| {
                ConfigurationError::Invalid {
                    name: "AZP_REMOVE_MAX_ATTEMPTS",
                    reason: format!("expected a positive integer, got '{raw}'"),
                }
            })?),
            None => None,
        };

        Ok(Self {
            url,
            identity: IdentityReference::new(client_id),
            pool: non_blank(env.pool).unwrap_or_else(|| DEFAULT_POOL.to_string()),
            agent_name,
            work_dir: non_blank(env.work).unwrap_or_else(|| DEFAULT_WORK_DIR.to_string()),
            placeholder: non_blank(env.placeholder).is_some(),
            agent_dir: non_blank(env.agent_dir).map_or_else(|| PathBuf::from("."), PathBuf::from),
            retry: RetryPolicy {
                interval,
                max_attempts,
            },
        })
    }

    /// The registration this process performs. Always uses replace semantics
    /// so re-runs under the same agent name do not collide.
    #[must_use]
    pub fn registration(&self) -> RegistrationRecord {
        RegistrationRecord {
            agent_name: self.agent_name.clone(),
            pool: self.pool.clone(),
            work_dir: self.work_dir.clone(),
            replace: true,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_url(raw: &str) -> Result<String, ConfigurationError> {
    let trimmed = raw.trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => {
            Ok(trimmed.to_string())
        }
        _ => Err(ConfigurationError::Invalid {
            name: "AZP_URL",
            reason: format!("expected an http(s) organization URL, got '{raw}'"),
        }),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
