//! JSON output helpers for `--json` code paths.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::domain::{
    AuthenticationError, ConfigurationError, DeregistrationExhausted, LifecycleError,
    PackageResolutionError, RegistrationError,
};

/// Format a JSON error object:
///
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = serde_json::json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Stable machine-readable category for an error chain.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if cause.is::<ConfigurationError>() {
            return "configuration";
        }
        if cause.is::<AuthenticationError>() {
            return "authentication";
        }
        if cause.is::<PackageResolutionError>() {
            return "package_resolution";
        }
        if cause.is::<RegistrationError>() {
            return "registration";
        }
        if cause.is::<DeregistrationExhausted>() {
            return "deregistration";
        }
        if cause.is::<LifecycleError>() {
            return "lifecycle";
        }
    }
    "internal"
}

/// Pretty-print any serializable value to stdout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn print<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    println!("{text}");
    Ok(())
}
