use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// Response envelope of `GET {org}/_apis/distributedtask/packages/agent`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageList {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub value: Vec<AgentPackage>,
}

/// One published agent build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPackage {
    #[serde(rename = "type", default)]
    pub package_type: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<DateTime<Utc>>,
    pub version: PackageVersion,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub filename: String,
    /// Hex SHA-256 of the archive, when the service publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_value: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct PackageVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl std::fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl PackageList {
    /// First downloadable package built for `platform`.
    ///
    /// The service is queried with `top=1`, but entries for other platforms or
    /// without a download URL are skipped rather than trusted.
    #[must_use]
    pub fn matching(&self, platform: Platform) -> Option<&AgentPackage> {
        self.value
            .iter()
            .find(|p| p.platform == platform.as_str() && !p.download_url.trim().is_empty())
    }
}
