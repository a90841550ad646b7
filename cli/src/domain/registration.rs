//! Agent registration record and the agent tool's command lines.
//!
//! The token is never part of an argument list: the agent reads it from
//! `VSTS_AGENT_INPUT_TOKEN` in its own environment.

/// Environment variable the agent's `config.sh` reads the token from.
pub const TOKEN_ENV: &str = "VSTS_AGENT_INPUT_TOKEN";

/// Bootstrap-only variables removed from (and hidden by) the agent process.
pub const SCRUBBED_ENV: &[&str] = &[
    TOKEN_ENV,
    "AZP_CLIENTID",
    "AZP_URL",
    "AZP_PLACEHOLDER",
    "IDENTITY_HEADER",
];

/// One registration of this process's agent in a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    pub agent_name: String,
    pub pool: String,
    pub work_dir: String,
    /// Replace an existing agent with the same name instead of failing.
    pub replace: bool,
}

/// Arguments for unattended `config.sh` registration against `url`.
#[must_use]
pub fn configure_args(url: &str, record: &RegistrationRecord) -> Vec<String> {
    let base: [&str; 11] = [
        "--unattended",
        "--agent",
        &record.agent_name,
        "--url",
        url,
        "--auth",
        "PAT",
        "--pool",
        &record.pool,
        "--work",
        &record.work_dir,
    ];
    let mut args: Vec<String> = base.iter().map(ToString::to_string).collect();
    if record.replace {
        args.push("--replace".to_string());
    }
    args.push("--acceptTeeEula".to_string());
    args
}

/// Arguments for unattended `config.sh remove`.
#[must_use]
pub fn remove_args() -> Vec<String> {
    ["remove", "--unattended", "--auth", "PAT"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Arguments for a single job cycle of `run.sh`.
#[must_use]
pub fn run_once_args() -> Vec<String> {
    vec!["--once".to_string()]
}

/// Value for `VSO_AGENT_IGNORE`, which stops the agent from exposing these
/// variables to job steps.
#[must_use]
pub fn agent_ignore_list() -> String {
    SCRUBBED_ENV.join(",")
}
