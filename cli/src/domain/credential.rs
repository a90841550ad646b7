//! Identity reference and the in-memory access token.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// Azure DevOps resource id that managed-identity tokens are requested for.
pub const AZURE_DEVOPS_RESOURCE: &str = "499b84ac-1321-427f-aa17-267ca6975798";

/// Managed-identity client id. Opaque, supplied by the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityReference(String);

impl IdentityReference {
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self(client_id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Short-lived bearer token for the CI platform.
///
/// Lives only in memory; the buffer is wiped on drop. `Debug` never shows
/// the secret. There is no `Display` or `Clone`.
pub struct AccessToken {
    secret: Zeroizing<String>,
    expires_on: Option<DateTime<Utc>>,
}

impl AccessToken {
    #[must_use]
    pub fn new(secret: String, expires_on: Option<DateTime<Utc>>) -> Self {
        Self {
            secret: Zeroizing::new(secret),
            expires_on,
        }
    }

    /// Raw secret, for handing to an HTTP header or a child environment.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.as_str()
    }

    #[must_use]
    pub fn expires_on(&self) -> Option<DateTime<Utc>> {
        self.expires_on
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}
