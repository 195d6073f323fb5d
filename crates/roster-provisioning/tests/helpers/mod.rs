//! Test helpers for roster-provisioning integration tests.
//!
//! Provides an in-memory platform double and catalog fixtures.

#![allow(dead_code)]

pub mod fake_platform;
pub mod test_data;

pub use fake_platform::{Call, FakePlatform};
pub use test_data::*;
