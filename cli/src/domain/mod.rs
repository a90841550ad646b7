//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod credential;
pub mod error;
pub mod lifecycle;
pub mod registration;
pub mod retry;

pub use config::{AgentEnv, AgentSettings};
pub use credential::{AccessToken, IdentityReference};
pub use error::{
    AuthenticationError, ConfigurationError, DeregistrationConflict, DeregistrationExhausted,
    LifecycleError, PackageResolutionError, RegistrationError,
};
pub use lifecycle::{Lifecycle, LifecycleState, Termination};
pub use registration::RegistrationRecord;
pub use retry::{RetryDecision, RetryPolicy};
