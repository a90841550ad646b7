//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: HTTP calls to the identity
//! endpoint and the organization, process execution, archive unpacking,
//! signal handling, and environment loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod agent_tool;
pub mod clock;
pub mod command_runner;
pub mod config;
pub mod identity;
pub mod packages;
pub mod signals;
