//! Managed-identity token client: implements the `TokenProvider` port.
//!
//! Container Apps and App Service expose `IDENTITY_ENDPOINT` +
//! `IDENTITY_HEADER`; VMs and everything else fall back to the instance
//! metadata service.

use std::time::Duration;

use anyhow::Result;
use pool_common::TokenResponse;
use zeroize::Zeroizing;

use crate::application::ports::TokenProvider;
use crate::domain::credential::AZURE_DEVOPS_RESOURCE;
use crate::domain::{AccessToken, AuthenticationError, IdentityReference};

pub const IMDS_TOKEN_URL: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
const IMDS_API_VERSION: &str = "2018-02-01";
const APP_SERVICE_API_VERSION: &str = "2019-08-01";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BODY_PREALLOC: usize = 64 * 1024;

/// Which flavour of identity endpoint to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEndpoint {
    /// Azure Instance Metadata Service.
    Imds { url: String },
    /// App Service / Container Apps local endpoint guarded by a header secret.
    AppService { url: String, header: String },
}

impl IdentityEndpoint {
    /// Pick the endpoint from the given variables (`IDENTITY_ENDPOINT`,
    /// `IDENTITY_HEADER`). Both must be present to use the local endpoint.
    #[must_use]
    pub fn detect(endpoint: Option<String>, header: Option<String>) -> Self {
        match (endpoint, header) {
            (Some(url), Some(header)) if !url.trim().is_empty() && !header.trim().is_empty() => {
                Self::AppService { url, header }
            }
            _ => Self::Imds {
                url: IMDS_TOKEN_URL.to_string(),
            },
        }
    }

    /// Read `IDENTITY_ENDPOINT` / `IDENTITY_HEADER` from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::detect(
            std::env::var("IDENTITY_ENDPOINT").ok(),
            std::env::var("IDENTITY_HEADER").ok(),
        )
    }

    fn base_url(&self) -> &str {
        match self {
            Self::Imds { url } | Self::AppService { url, .. } => url,
        }
    }

    /// Query string for a token request on behalf of `client_id`.
    #[must_use]
    pub fn query(&self, client_id: &str) -> [(&'static str, String); 3] {
        let version = match self {
            Self::Imds { .. } => IMDS_API_VERSION,
            Self::AppService { .. } => APP_SERVICE_API_VERSION,
        };
        [
            ("api-version", version.to_string()),
            ("resource", AZURE_DEVOPS_RESOURCE.to_string()),
            ("client_id", client_id.to_string()),
        ]
    }
}

/// `TokenProvider` backed by a managed-identity HTTP endpoint.
pub struct ManagedIdentityClient {
    http: reqwest::Client,
    endpoint: IdentityEndpoint,
}

impl ManagedIdentityClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: IdentityEndpoint) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, endpoint })
    }
}

impl TokenProvider for ManagedIdentityClient {
    async fn acquire(&self, identity: &IdentityReference) -> Result<AccessToken> {
        let mut request = self
            .http
            .get(self.endpoint.base_url())
            .query(&self.endpoint.query(identity.as_str()));
        request = match &self.endpoint {
            IdentityEndpoint::Imds { .. } => request.header("Metadata", "true"),
            IdentityEndpoint::AppService { header, .. } => {
                request.header("X-IDENTITY-HEADER", header)
            }
        };

        tracing::debug!(endpoint = self.endpoint.base_url(), "requesting managed-identity token");
        let response = request
            .send()
            .await
            .map_err(|e| AuthenticationError::Unreachable(e.without_url().to_string()))?;

        let status = response.status();
        let body = read_body(response).await?;
        if !status.is_success() {
            return Err(AuthenticationError::Rejected {
                status: status.as_u16(),
                detail: error_detail(&body),
            }
            .into());
        }
        Ok(parse_token(&body)?)
    }
}

/// Collect the body into a buffer that is wiped on drop.
///
/// Transport buffers inside `reqwest` are not ours to wipe; this bounds the
/// copies the process keeps after parsing to the `AccessToken` itself.
async fn read_body(
    mut response: reqwest::Response,
) -> Result<Zeroizing<Vec<u8>>, AuthenticationError> {
    let capacity = response
        .content_length()
        .and_then(|n| usize::try_from(n).ok())
        .map_or(4096, |n| n.min(MAX_BODY_PREALLOC));
    let mut body = Zeroizing::new(Vec::with_capacity(capacity));
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| AuthenticationError::Unreachable(e.without_url().to_string()))?
    {
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Turn a 2xx token body into an `AccessToken`.
///
/// # Errors
///
/// Returns `AuthenticationError::Malformed` for unparsable JSON or an empty token.
pub fn parse_token(body: &[u8]) -> Result<AccessToken, AuthenticationError> {
    let parsed: TokenResponse = serde_json::from_slice(body)
        .map_err(|e| AuthenticationError::Malformed(format!("invalid JSON: {e}")))?;
    if parsed.access_token.trim().is_empty() {
        return Err(AuthenticationError::Malformed(
            "access_token is empty".to_string(),
        ));
    }
    let expires_on = parsed.expires_on.as_ref().and_then(|e| e.to_datetime());
    Ok(AccessToken::new(parsed.access_token, expires_on))
}

/// Short, token-free description of an error body (`error_description` of
/// an OAuth error document, else the first line of the body).
fn error_detail(body: &[u8]) -> String {
    #[derive(serde::Deserialize)]
    struct OAuthError {
        error: Option<String>,
        error_description: Option<String>,
    }

    if let Ok(err) = serde_json::from_slice::<OAuthError>(body) {
        if let Some(desc) = err.error_description.or(err.error) {
            return desc;
        }
    }
    let text = String::from_utf8_lossy(body);
    text.lines().next().unwrap_or("").chars().take(200).collect()
}
