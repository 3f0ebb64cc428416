//! Testing utilities and mock implementations
//!
//! Provides in-memory transport and console implementations so chat logic
//! can be tested without a broker or a terminal.

pub mod mocks;

pub use mocks::*;
