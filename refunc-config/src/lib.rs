//! Configuration management for the refunc lambda emulator.
//!
//! Provides environment detection, configuration loading from YAML files and
//! environment variables, secret handling, and the configuration types shared
//! by the emulator binaries.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
