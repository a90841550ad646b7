//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. None of them ever carries the access token.

use thiserror::Error;

use crate::domain::lifecycle::LifecycleState;

// ── Configuration errors ──────────────────────────────────────────────────────

/// Missing or unusable input. Raised before any network call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("{name} is required but was not set")]
    Missing { name: &'static str },

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

// ── Authentication errors ─────────────────────────────────────────────────────

/// The managed-identity token exchange failed. Never retried.
#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("identity endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("identity endpoint rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("identity endpoint returned an unusable token response: {0}")]
    Malformed(String),
}

// ── Package resolution errors ─────────────────────────────────────────────────

/// No usable agent package. A wrong organization URL and an invalid token
/// both surface as `NoMatch`: the caller cannot tell them apart.
#[derive(Debug, Error)]
pub enum PackageResolutionError {
    #[error(
        "could not determine a matching agent package for {platform}; \
         check that '{url}' is correct and the token is valid for that organization"
    )]
    NoMatch { url: String, platform: String },

    #[error("{0}")]
    UnsupportedPlatform(#[from] pool_common::UnsupportedPlatform),

    #[error("failed to download agent package: {0}")]
    Download(String),

    #[error("agent package checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("failed to unpack agent package: {0}")]
    Unpack(String),
}

// ── Registration errors ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("agent registration into pool '{pool}' failed (exit {code}): {detail}")]
    Rejected {
        pool: String,
        code: String,
        detail: String,
    },
}

// ── Deregistration errors ─────────────────────────────────────────────────────

/// One failed removal attempt, usually because a job is still running.
/// Retried with a fixed back-off, never fatal on its own.
#[derive(Debug, Error)]
#[error("agent removal attempt {attempt} rejected: {detail}")]
pub struct DeregistrationConflict {
    pub attempt: u32,
    pub detail: String,
}

/// An operator-configured retry cap ran out before removal succeeded.
#[derive(Debug, Error)]
#[error(
    "agent is still registered after {attempts} removal attempts; \
     remove it from the pool manually"
)]
pub struct DeregistrationExhausted {
    pub attempts: u32,
}

// ── Lifecycle errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid lifecycle transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: LifecycleState,
        to: LifecycleState,
    },
}
