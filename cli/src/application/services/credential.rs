//! Application service: Credential Resolver.

use anyhow::{Context, Result};

use crate::application::ports::{ProgressReporter, TokenProvider};
use crate::domain::{AccessToken, IdentityReference};

/// Exchange the managed identity for an access token.
///
/// Fatal on failure: no retry.
///
/// # Errors
///
/// Propagates the provider's `AuthenticationError`.
pub async fn resolve_credential(
    tokens: &impl TokenProvider,
    identity: &IdentityReference,
    reporter: &impl ProgressReporter,
) -> Result<AccessToken> {
    reporter.step("Acquiring access token from managed identity...");
    let token = tokens
        .acquire(identity)
        .await
        .context("credential resolution failed")?;
    tracing::info!(
        client_id = identity.as_str(),
        expires_on = ?token.expires_on(),
        "access token acquired"
    );
    Ok(token)
}
