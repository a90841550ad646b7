//! Unit tests for pool-agent
//!
//! These tests use hand-written port mocks and run fast without network
//! access or child processes.

mod architecture;
mod mocks;
