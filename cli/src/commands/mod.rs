//! Command implementations

pub mod check;
pub mod remove;
pub mod run;
pub mod version;
