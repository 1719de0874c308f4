//! Common test utilities for the run lifecycle tests.
//!
//! - Fixtures: sample launch configuration, `sh` script launcher, harness
//! - Assertions: event collection and extraction helpers

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
