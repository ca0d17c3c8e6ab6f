//! Scenario loading and session running for the `terrasim` binary.

pub mod loader;
