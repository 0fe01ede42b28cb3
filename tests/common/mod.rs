//! Common test utilities for subject-relay integration tests

#[allow(dead_code)]
pub mod fake_api;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fake_api::*;
#[allow(unused_imports)]
pub use fixtures::*;
