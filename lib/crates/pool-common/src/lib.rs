pub mod packages;
pub mod platform;
pub mod token;

pub use packages::{AgentPackage, PackageList, PackageVersion};
pub use platform::{Platform, UnsupportedPlatform};
pub use token::{EpochSeconds, TokenResponse};
