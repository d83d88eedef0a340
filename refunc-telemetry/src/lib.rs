//! Tracing setup shared by the refunc binaries.

pub mod tracing;
