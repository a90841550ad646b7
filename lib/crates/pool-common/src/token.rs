use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body returned by the managed-identity token endpoints (IMDS and the
/// App Service / Container Apps `IDENTITY_ENDPOINT`).
///
/// No `Serialize`: the access token must not be written back out.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_on: Option<EpochSeconds>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("expires_on", &self.expires_on)
            .field("resource", &self.resource)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Unix timestamp that IMDS sends as a string and some endpoints as a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EpochSeconds {
    Number(i64),
    Text(String),
}

impl EpochSeconds {
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let secs = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        DateTime::from_timestamp(secs, 0)
    }
}
