//! # Tally application library
//!
//! Scenario replay and CLI plumbing, exposed as a library so integration
//! tests can drive them without spawning the binary.

pub mod cli;
pub mod scenario;
