//! Integration tests for pool-agent
//!
//! These tests spawn the actual binary with a cleared environment, so no
//! test reaches a real identity endpoint or organization.

mod cli_tests;
mod config_errors;
