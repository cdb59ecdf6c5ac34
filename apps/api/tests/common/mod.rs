//! Common test utilities for API integration tests
//!
//! Shared fixtures for building client signals plus helpers for driving a
//! hub in-process or a real server over WebSockets.

#![allow(unused_imports)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
