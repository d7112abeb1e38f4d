// Common test utilities
#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use harness::*;
