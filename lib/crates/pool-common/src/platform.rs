use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Agent package platform identifier as used by the `packages/agent` API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Platform {
    #[serde(rename = "linux-x64")]
    LinuxX64,
    #[serde(rename = "linux-arm64")]
    LinuxArm64,
    #[serde(rename = "linux-arm")]
    LinuxArm,
    #[serde(rename = "osx-x64")]
    OsxX64,
    #[serde(rename = "osx-arm64")]
    OsxArm64,
}

/// The host OS/arch pair has no published agent package.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no agent package is published for {os}-{arch}")]
pub struct UnsupportedPlatform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Map a Rust `(OS, ARCH)` pair (as in `std::env::consts`) to a package platform.
    pub fn from_os_arch(os: &str, arch: &str) -> Result<Self, UnsupportedPlatform> {
        match (os, arch) {
            ("linux", "x86_64") => Ok(Self::LinuxX64),
            ("linux", "aarch64") => Ok(Self::LinuxArm64),
            ("linux", "arm") => Ok(Self::LinuxArm),
            ("macos", "x86_64") => Ok(Self::OsxX64),
            ("macos", "aarch64") => Ok(Self::OsxArm64),
            _ => Err(UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            }),
        }
    }

    /// Platform of the running binary.
    pub fn current() -> Result<Self, UnsupportedPlatform> {
        Self::from_os_arch(std::env::consts::OS, std::env::consts::ARCH)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinuxX64 => "linux-x64",
            Self::LinuxArm64 => "linux-arm64",
            Self::LinuxArm => "linux-arm",
            Self::OsxX64 => "osx-x64",
            Self::OsxArm64 => "osx-arm64",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
