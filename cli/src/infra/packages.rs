//! Agent package infrastructure: implements `AgentPackages` against the
//! organization's `distributedtask/packages/agent` API.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use pool_common::{AgentPackage, PackageList, Platform};
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

use crate::application::ports::AgentPackages;
use crate::domain::{AccessToken, PackageResolutionError};

const LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Production `AgentPackages` over HTTPS.
pub struct DevOpsPackages {
    http: reqwest::Client,
}

impl DevOpsPackages {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(LIST_TIMEOUT)
            .build()?;
        Ok(Self { http })
    }
}

/// Listing endpoint for the latest package of `platform`.
#[must_use]
pub fn package_list_url(org_url: &str, platform: Platform) -> String {
    format!(
        "{}/_apis/distributedtask/packages/agent?platform={platform}&top=1",
        org_url.trim_end_matches('/')
    )
}

impl AgentPackages for DevOpsPackages {
    async fn latest(
        &self,
        url: &str,
        token: &AccessToken,
        platform: Platform,
    ) -> Result<AgentPackage> {
        let no_match = || PackageResolutionError::NoMatch {
            url: url.to_string(),
            platform: platform.to_string(),
        };

        let response = self
            .http
            .get(package_list_url(url, platform))
            .bearer_auth(token.expose())
            .header("Accept", "application/json")
            .timeout(LIST_TIMEOUT)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(error = %e.without_url(), "package listing request failed");
                no_match()
            })?;

        // A bad token is answered with a 203 sign-in page rather than a 401.
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::debug!(status = status.as_u16(), "package listing rejected");
            return Err(no_match().into());
        }

        let list: PackageList = response.json().await.map_err(|e| {
            tracing::debug!(error = %e.without_url(), "package listing not understood");
            no_match()
        })?;
        list.matching(platform).cloned().ok_or_else(|| no_match().into())
    }

    async fn install(&self, package: &AgentPackage, dest: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dest)
            .await
            .with_context(|| format!("creating {}", dest.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(".agent-download-")
            .suffix(".tar.gz")
            .tempfile_in(dest)
            .with_context(|| format!("creating staging file in {}", dest.display()))?;

        let mut response = self
            .http
            .get(&package.download_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PackageResolutionError::Download(e.to_string()))?;

        let mut file = tokio::fs::File::from_std(staging.reopen()?);
        let mut hasher = Sha256::new();
        let mut total: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| PackageResolutionError::Download(e.to_string()))?
        {
            hasher.update(&chunk);
            file.write_all(&chunk).await?;
            total += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);
        tracing::info!(bytes = total, filename = %package.filename, "agent package downloaded");

        if let Some(expected) = &package.hash_value {
            verify_digest(&hasher.finalize(), expected)?;
        }

        let archive = staging.path().to_path_buf();
        let target = dest.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_archive(&archive, &target))
            .await
            .context("spawn_blocking for unpack_archive")??;
        Ok(())
    }
}

/// Compare a computed SHA-256 digest with the published hex value.
///
/// # Errors
///
/// Returns `PackageResolutionError::ChecksumMismatch` when they differ.
pub fn verify_digest(digest: &[u8], expected_hex: &str) -> Result<(), PackageResolutionError> {
    let actual = hex_encode(digest);
    if actual.eq_ignore_ascii_case(expected_hex.trim()) {
        Ok(())
    } else {
        Err(PackageResolutionError::ChecksumMismatch {
            expected: expected_hex.trim().to_lowercase(),
            actual,
        })
    }
}

/// Unpack a `.tar.gz` agent archive into `dest`, keeping file modes so
/// `config.sh` and `run.sh` stay executable.
///
/// # Errors
///
/// Returns `PackageResolutionError::Unpack` if the archive is unreadable.
pub fn unpack_archive(archive: &Path, dest: &Path) -> Result<(), PackageResolutionError> {
    let file = std::fs::File::open(archive)
        .map_err(|e| PackageResolutionError::Unpack(format!("{}: {e}", archive.display())))?;
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.set_preserve_permissions(true);
    tar.set_overwrite(true);
    tar.unpack(dest)
        .map_err(|e| PackageResolutionError::Unpack(e.to_string()))
}

fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
