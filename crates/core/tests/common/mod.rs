//! Common test utilities shared by the integration tests.
//!
//! - Fixtures: snapshots, blueprints and wired-up components
//! - Assertions over the emitted event stream

pub mod assertions;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
